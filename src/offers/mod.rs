//! Offer library: the record type, its derived financials, and input
//! validation for create/edit.
//!
//! `profit` and `roi` are never stored. Every surface (board cards, analytics,
//! CLI tables, CSV export) goes through [`profit`] and [`roi`] so the numbers
//! cannot drift apart.

pub mod board;
pub mod csv_io;
pub mod store;

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{OfferError, Result};

/// Maximum number of upsell links an offer can carry.
pub const MAX_UPSELL_LINKS: usize = 7;

/// Fallback label for offers without a platform.
pub const NO_PLATFORM_LABEL: &str = "N/A";

/// Fallback label for offers without a niche.
pub const NO_NICHE_LABEL: &str = "N/A";

/// Display label for offers without a niche in listings.
pub const NO_NICHE_DISPLAY: &str = "Sem Nicho";

/// Platforms offered by the create form. Free text is still accepted.
pub const KNOWN_PLATFORMS: &[&str] = &["Google Ads", "Facebook Ads", "TikTok Ads", "Outra"];

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("URL regex must compile")
});

// ---------------------------------------------------------------------------
// Derived financials
// ---------------------------------------------------------------------------

/// `revenue - cost`.
pub fn profit(revenue: f64, cost: f64) -> f64 {
    revenue - cost
}

/// `profit / cost * 100` when `cost > 0`, otherwise `0`.
pub fn roi(profit: f64, cost: f64) -> f64 {
    if cost > 0.0 {
        (profit / cost) * 100.0
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Scale status
// ---------------------------------------------------------------------------

/// Pipeline stage of an offer. Drives Kanban column placement only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ScaleStatus {
    #[default]
    #[serde(rename = "Inicio")]
    Inicio,
    #[serde(rename = "Pré escala")]
    PreEscala,
    #[serde(rename = "Escalando")]
    Escalando,
    #[serde(rename = "ESCALADISSIMA")]
    Escaladissima,
}

impl ScaleStatus {
    /// All statuses in board column order.
    pub const ALL: [ScaleStatus; 4] = [
        Self::Inicio,
        Self::PreEscala,
        Self::Escalando,
        Self::Escaladissima,
    ];

    /// The stored label (also the CSV value).
    pub fn label(self) -> &'static str {
        match self {
            Self::Inicio => "Inicio",
            Self::PreEscala => "Pré escala",
            Self::Escalando => "Escalando",
            Self::Escaladissima => "ESCALADISSIMA",
        }
    }

    /// Column title shown on the board.
    pub fn title(self) -> &'static str {
        match self {
            Self::Inicio => "🚀 Inicio",
            Self::PreEscala => "📈 Pré escala",
            Self::Escalando => "🔥 Escalando",
            Self::Escaladissima => "💸 ESCALADISSIMA",
        }
    }

    /// Parse a status label. Accepts the exact labels plus case-insensitive,
    /// accent-less, kebab/underscore variants (`pre-escala`, `escalando`).
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .to_lowercase()
            .replace('é', "e")
            .chars()
            .map(|c| if c == '-' || c == '_' { ' ' } else { c })
            .collect();

        match normalized.as_str() {
            "inicio" | "início" => Some(Self::Inicio),
            "pre escala" | "preescala" => Some(Self::PreEscala),
            "escalando" => Some(Self::Escalando),
            "escaladissima" => Some(Self::Escaladissima),
            _ => None,
        }
    }

    /// Parse a possibly-missing label, falling back to [`ScaleStatus::Inicio`].
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or_default()
    }
}

impl fmt::Display for ScaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl<'de> Deserialize<'de> for ScaleStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self::parse_or_default(raw.as_deref()))
    }
}

// ---------------------------------------------------------------------------
// Offer record
// ---------------------------------------------------------------------------

/// External links attached to an offer. Not used by analytics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferLinks {
    pub sales_page_link: Option<String>,
    pub checkout_link: Option<String>,
    /// Upsell pages in funnel order, at most [`MAX_UPSELL_LINKS`].
    pub upsell_links: Vec<String>,
    pub thank_you_page_link: Option<String>,
    pub drive_link: Option<String>,
    pub ad_library_link: Option<String>,
}

impl OfferLinks {
    /// Labelled, non-empty links in display order.
    pub fn labelled(&self) -> Vec<(String, &str)> {
        let mut out = Vec::new();
        if let Some(link) = &self.sales_page_link {
            out.push(("Página de Vendas".to_string(), link.as_str()));
        }
        if let Some(link) = &self.checkout_link {
            out.push(("Checkout".to_string(), link.as_str()));
        }
        for (i, link) in self.upsell_links.iter().enumerate() {
            out.push((format!("Upsell {}", i + 1), link.as_str()));
        }
        if let Some(link) = &self.thank_you_page_link {
            out.push(("Página de Obrigado".to_string(), link.as_str()));
        }
        if let Some(link) = &self.drive_link {
            out.push(("Drive".to_string(), link.as_str()));
        }
        if let Some(link) = &self.ad_library_link {
            out.push(("Biblioteca de Anúncios".to_string(), link.as_str()));
        }
        out
    }

    fn normalize(&mut self) -> Result<()> {
        for (field, slot) in [
            ("sales_page_link", &mut self.sales_page_link),
            ("checkout_link", &mut self.checkout_link),
            ("thank_you_page_link", &mut self.thank_you_page_link),
            ("drive_link", &mut self.drive_link),
            ("ad_library_link", &mut self.ad_library_link),
        ] {
            *slot = non_empty(slot.take());
            if let Some(url) = slot.as_deref() {
                validate_url(field, url)?;
            }
        }

        self.upsell_links = std::mem::take(&mut self.upsell_links)
            .into_iter()
            .filter_map(|s| non_empty(Some(s)))
            .collect();
        if self.upsell_links.len() > MAX_UPSELL_LINKS {
            return Err(OfferError::validation(format!(
                "at most {MAX_UPSELL_LINKS} upsell links are allowed, got {}",
                self.upsell_links.len()
            )));
        }
        for url in &self.upsell_links {
            validate_url("upsell_links", url)?;
        }
        Ok(())
    }
}

/// A tracked advertising offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub niche: Option<String>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub revenue: Option<f64>,
    #[serde(default)]
    pub scale_status: ScaleStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub links: OfferLinks,
    #[serde(default)]
    pub observations: Option<String>,
}

impl Offer {
    /// Recorded cost, `0` when absent.
    pub fn cost_or_zero(&self) -> f64 {
        self.cost.unwrap_or(0.0)
    }

    /// Recorded revenue, `0` when absent.
    pub fn revenue_or_zero(&self) -> f64 {
        self.revenue.unwrap_or(0.0)
    }

    pub fn profit(&self) -> f64 {
        profit(self.revenue_or_zero(), self.cost_or_zero())
    }

    pub fn roi(&self) -> f64 {
        roi(self.profit(), self.cost_or_zero())
    }

    /// Whether any financial figure has been recorded.
    pub fn has_financials(&self) -> bool {
        self.cost.is_some() || self.revenue.is_some()
    }

    /// Platform grouping key, with the fallback label for missing values.
    pub fn platform_key(&self) -> &str {
        key_or(self.platform.as_deref(), NO_PLATFORM_LABEL)
    }

    /// Niche grouping key, with the fallback label for missing values.
    pub fn niche_key(&self) -> &str {
        key_or(self.niche.as_deref(), NO_NICHE_LABEL)
    }

    /// Niche as shown in listings.
    pub fn niche_display(&self) -> &str {
        key_or(self.niche.as_deref(), NO_NICHE_DISPLAY)
    }
}

fn key_or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => fallback,
    }
}

// ---------------------------------------------------------------------------
// Create / edit input
// ---------------------------------------------------------------------------

/// Input for creating an offer (form submission, CLI `add`, CSV row).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewOffer {
    pub name: String,
    pub image_url: Option<String>,
    pub platform: Option<String>,
    pub niche: Option<String>,
    pub cost: Option<f64>,
    pub revenue: Option<f64>,
    pub scale_status: Option<ScaleStatus>,
    pub links: OfferLinks,
    pub observations: Option<String>,
}

impl NewOffer {
    /// Trim and normalise empty strings to `None`, then validate.
    pub fn normalized(mut self) -> Result<Self> {
        self.name = self.name.trim().to_string();
        validate_name(&self.name)?;

        self.image_url = non_empty(self.image_url);
        if let Some(url) = self.image_url.as_deref() {
            validate_url("image_url", url)?;
        }
        self.platform = non_empty(self.platform);
        self.niche = non_empty(self.niche);
        self.observations = non_empty(self.observations);
        validate_amount("cost", self.cost)?;
        validate_amount("revenue", self.revenue)?;
        self.links.normalize()?;

        Ok(self)
    }

    /// Build the stored record. Callers are expected to have normalised first.
    pub fn into_offer(self, id: String, created_at: DateTime<Utc>) -> Offer {
        Offer {
            id,
            name: self.name,
            image_url: self.image_url,
            platform: self.platform,
            niche: self.niche,
            cost: self.cost,
            revenue: self.revenue,
            scale_status: self.scale_status.unwrap_or_default(),
            created_at,
            links: self.links,
            observations: self.observations,
        }
    }
}

/// Partial update for an offer. `None` leaves the field untouched; an empty
/// string clears an optional text field. `id` and `created_at` are immutable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferPatch {
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub platform: Option<String>,
    pub niche: Option<String>,
    pub cost: Option<f64>,
    pub revenue: Option<f64>,
    pub scale_status: Option<ScaleStatus>,
    pub links: Option<OfferLinks>,
    pub observations: Option<String>,
}

impl OfferPatch {
    /// Status-only patch, as issued by a board move.
    pub fn status(status: ScaleStatus) -> Self {
        Self {
            scale_status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to a copy of `offer`, validating the result.
    pub fn apply(self, offer: &Offer) -> Result<Offer> {
        let mut next = offer.clone();

        if let Some(name) = self.name {
            let name = name.trim().to_string();
            validate_name(&name)?;
            next.name = name;
        }
        if let Some(url) = self.image_url {
            next.image_url = non_empty(Some(url));
            if let Some(url) = next.image_url.as_deref() {
                validate_url("image_url", url)?;
            }
        }
        if let Some(platform) = self.platform {
            next.platform = non_empty(Some(platform));
        }
        if let Some(niche) = self.niche {
            next.niche = non_empty(Some(niche));
        }
        if self.cost.is_some() {
            validate_amount("cost", self.cost)?;
            next.cost = self.cost;
        }
        if self.revenue.is_some() {
            validate_amount("revenue", self.revenue)?;
            next.revenue = self.revenue;
        }
        if let Some(status) = self.scale_status {
            next.scale_status = status;
        }
        if let Some(mut links) = self.links {
            links.normalize()?;
            next.links = links;
        }
        if let Some(notes) = self.observations {
            next.observations = non_empty(Some(notes));
        }

        Ok(next)
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn validate_name(name: &str) -> Result<()> {
    if name.chars().count() < 2 {
        return Err(OfferError::validation(
            "name must have at least 2 characters",
        ));
    }
    Ok(())
}

fn validate_amount(field: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() => Err(OfferError::validation(format!(
            "{field} must be a finite number"
        ))),
        Some(v) if v < 0.0 => Err(OfferError::validation(format!(
            "{field} must not be negative"
        ))),
        _ => Ok(()),
    }
}

fn validate_url(field: &str, url: &str) -> Result<()> {
    if URL_RE.is_match(url) {
        Ok(())
    } else {
        Err(OfferError::validation(format!(
            "{field} must be an http(s) URL, got '{url}'"
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(cost: Option<f64>, revenue: Option<f64>) -> Offer {
        NewOffer {
            name: "Oferta".to_string(),
            cost,
            revenue,
            ..NewOffer::default()
        }
        .into_offer("id-1".to_string(), Utc::now())
    }

    #[test]
    fn profit_and_roi_are_derived() {
        let o = offer(Some(100.0), Some(250.0));
        assert_eq!(o.profit(), 150.0);
        assert_eq!(o.roi(), 150.0);
    }

    #[test]
    fn missing_amounts_count_as_zero() {
        let o = offer(None, Some(80.0));
        assert_eq!(o.profit(), 80.0);
        assert_eq!(o.roi(), 0.0);
        assert!(o.has_financials());
        assert!(!offer(None, None).has_financials());
    }

    #[test]
    fn status_parse_accepts_variants() {
        assert_eq!(ScaleStatus::parse("Pré escala"), Some(ScaleStatus::PreEscala));
        assert_eq!(ScaleStatus::parse("pre-escala"), Some(ScaleStatus::PreEscala));
        assert_eq!(ScaleStatus::parse("ESCALANDO"), Some(ScaleStatus::Escalando));
        assert_eq!(
            ScaleStatus::parse("escaladissima"),
            Some(ScaleStatus::Escaladissima)
        );
        assert_eq!(ScaleStatus::parse("bogus"), None);
        assert_eq!(ScaleStatus::parse_or_default(None), ScaleStatus::Inicio);
    }

    #[test]
    fn status_deserializes_null_and_unknown_as_inicio() {
        let s: ScaleStatus = serde_json::from_str("null").unwrap();
        assert_eq!(s, ScaleStatus::Inicio);
        let s: ScaleStatus = serde_json::from_str("\"whatever\"").unwrap();
        assert_eq!(s, ScaleStatus::Inicio);
        let s: ScaleStatus = serde_json::from_str("\"Escalando\"").unwrap();
        assert_eq!(s, ScaleStatus::Escalando);
        assert_eq!(
            serde_json::to_string(&ScaleStatus::PreEscala).unwrap(),
            "\"Pré escala\""
        );
    }

    #[test]
    fn new_offer_normalizes_empty_strings() {
        let input = NewOffer {
            name: "  Curso X  ".to_string(),
            platform: Some("".to_string()),
            niche: Some("  Saúde ".to_string()),
            links: OfferLinks {
                checkout_link: Some(" ".to_string()),
                upsell_links: vec!["".to_string(), "https://up.example/1".to_string()],
                ..OfferLinks::default()
            },
            ..NewOffer::default()
        };
        let n = input.normalized().unwrap();
        assert_eq!(n.name, "Curso X");
        assert_eq!(n.platform, None);
        assert_eq!(n.niche.as_deref(), Some("Saúde"));
        assert_eq!(n.links.checkout_link, None);
        assert_eq!(n.links.upsell_links, vec!["https://up.example/1"]);
    }

    #[test]
    fn new_offer_rejects_bad_input() {
        let short = NewOffer {
            name: "x".to_string(),
            ..NewOffer::default()
        };
        assert!(matches!(short.normalized(), Err(OfferError::Validation(_))));

        let negative = NewOffer {
            name: "Oferta".to_string(),
            cost: Some(-1.0),
            ..NewOffer::default()
        };
        assert!(negative.normalized().is_err());

        let bad_link = NewOffer {
            name: "Oferta".to_string(),
            links: OfferLinks {
                drive_link: Some("drive.google.com/abc".to_string()),
                ..OfferLinks::default()
            },
            ..NewOffer::default()
        };
        assert!(bad_link.normalized().is_err());

        let too_many = NewOffer {
            name: "Oferta".to_string(),
            links: OfferLinks {
                upsell_links: (0..8).map(|i| format!("https://u.example/{i}")).collect(),
                ..OfferLinks::default()
            },
            ..NewOffer::default()
        };
        assert!(too_many.normalized().is_err());
    }

    #[test]
    fn patch_keeps_identity_and_clears_fields() {
        let mut original = offer(Some(10.0), Some(20.0));
        original.niche = Some("Finanças".to_string());

        let patch = OfferPatch {
            name: Some("Novo nome".to_string()),
            niche: Some(String::new()),
            revenue: Some(50.0),
            ..OfferPatch::default()
        };
        let updated = patch.apply(&original).unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.name, "Novo nome");
        assert_eq!(updated.niche, None);
        assert_eq!(updated.revenue, Some(50.0));
        assert_eq!(updated.cost, Some(10.0));
    }

    #[test]
    fn fallback_keys() {
        let mut o = offer(None, None);
        assert_eq!(o.platform_key(), "N/A");
        assert_eq!(o.niche_key(), "N/A");
        o.platform = Some("TikTok Ads".to_string());
        assert_eq!(o.platform_key(), "TikTok Ads");
    }
}

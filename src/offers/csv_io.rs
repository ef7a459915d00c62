//! CSV import and export of offers.
//!
//! Column headers are the Portuguese labels users already have in their
//! spreadsheets. Export writes a UTF-8 BOM so Excel picks the right encoding;
//! import tolerates it.

use std::collections::HashMap;
use std::io::{Read, Write};

use chrono::FixedOffset;
use serde::Serialize;
use tracing::{debug, warn};

use super::store::OfferStore;
use super::{MAX_UPSELL_LINKS, NewOffer, Offer, OfferLinks, ScaleStatus};
use crate::error::{OfferError, Result};

const UTF8_BOM: &str = "\u{feff}";

pub const COL_NAME: &str = "Nome da Oferta";
pub const COL_PLATFORM: &str = "Plataforma";
pub const COL_NICHE: &str = "Nicho";
pub const COL_STATUS: &str = "Status da Escala";
pub const COL_COST: &str = "Custo";
pub const COL_REVENUE: &str = "Receita";
pub const COL_PROFIT: &str = "Lucro";
pub const COL_ROI: &str = "ROI";
pub const COL_SALES_PAGE: &str = "Link da Página de Vendas";
pub const COL_CHECKOUT: &str = "Link do Checkout";
pub const COL_THANK_YOU: &str = "Link da Página de Obrigado";
pub const COL_DRIVE: &str = "Link do Drive";
pub const COL_AD_LIBRARY: &str = "Link da Biblioteca de Anúncios";
pub const COL_CREATED_AT: &str = "Data de Criação";
pub const COL_IMAGE: &str = "URL da Imagem";
pub const COL_NOTES: &str = "Observações";

fn upsell_column(n: usize) -> String {
    format!("Link do Upsell {n}")
}

/// Export header row, in column order.
pub fn export_headers() -> Vec<String> {
    let mut headers: Vec<String> = [
        COL_NAME,
        COL_PLATFORM,
        COL_NICHE,
        COL_STATUS,
        COL_COST,
        COL_REVENUE,
        COL_PROFIT,
        COL_ROI,
        COL_SALES_PAGE,
        COL_CHECKOUT,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    headers.extend((1..=MAX_UPSELL_LINKS).map(upsell_column));
    headers.extend(
        [
            COL_THANK_YOU,
            COL_DRIVE,
            COL_AD_LIBRARY,
            COL_CREATED_AT,
            COL_IMAGE,
            COL_NOTES,
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    headers
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn amount(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

fn export_row(offer: &Offer, tz: &FixedOffset) -> Vec<String> {
    let mut row = vec![
        offer.name.clone(),
        opt(&offer.platform),
        opt(&offer.niche),
        offer.scale_status.label().to_string(),
        amount(offer.cost),
        amount(offer.revenue),
        format!("{:.2}", offer.profit()),
        format!("{:.2}", offer.roi()),
        opt(&offer.links.sales_page_link),
        opt(&offer.links.checkout_link),
    ];
    row.extend(
        (0..MAX_UPSELL_LINKS).map(|i| offer.links.upsell_links.get(i).cloned().unwrap_or_default()),
    );
    row.extend([
        opt(&offer.links.thank_you_page_link),
        opt(&offer.links.drive_link),
        opt(&offer.links.ad_library_link),
        offer
            .created_at
            .with_timezone(tz)
            .format("%d/%m/%Y %H:%M:%S")
            .to_string(),
        opt(&offer.image_url),
        opt(&offer.observations),
    ]);
    row
}

/// Write `offers` as CSV (BOM + header + one row per offer).
pub fn write_offers<W: Write>(mut out: W, offers: &[Offer], tz: &FixedOffset) -> Result<()> {
    out.write_all(UTF8_BOM.as_bytes())?;
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(export_headers())?;
    for offer in offers {
        writer.write_record(export_row(offer, tz))?;
    }
    writer.flush()?;
    Ok(())
}

/// Render `offers` as a CSV string.
pub fn export_to_string(offers: &[Offer], tz: &FixedOffset) -> Result<String> {
    let mut buf = Vec::new();
    write_offers(&mut buf, offers, tz)?;
    String::from_utf8(buf).map_err(|e| OfferError::validation(e.to_string()))
}

/// Default export file name, e.g. `ofertas-2024-05-01.csv`.
pub fn export_file_name(today: chrono::NaiveDate) -> String {
    format!("ofertas-{}.csv", today.format("%Y-%m-%d"))
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Summary of an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    /// Rows dropped for missing required columns or unreadable numbers.
    pub skipped: usize,
}

/// Parse a decimal written either as `1234.5`, `1234,5` or `1.234,50`.
fn parse_decimal(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let cleaned = raw.trim_start_matches("R$").trim();
    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned.to_string()
    };
    normalized.parse::<f64>().ok()
}

struct Row<'a> {
    index: &'a HashMap<String, usize>,
    record: &'a csv::StringRecord,
}

impl Row<'_> {
    fn get(&self, column: &str) -> Option<String> {
        let idx = *self.index.get(column)?;
        self.record
            .get(idx)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn amount(&self, column: &str) -> std::result::Result<Option<f64>, String> {
        match self.get(column) {
            None => Ok(None),
            Some(raw) => parse_decimal(&raw)
                .map(Some)
                .ok_or_else(|| format!("{column}: '{raw}' is not a number")),
        }
    }

    fn to_new_offer(&self) -> std::result::Result<NewOffer, String> {
        let name = self.get(COL_NAME).ok_or("missing offer name")?;
        let platform = self.get(COL_PLATFORM).ok_or("missing platform")?;

        Ok(NewOffer {
            name,
            image_url: self.get(COL_IMAGE),
            platform: Some(platform),
            niche: self.get(COL_NICHE),
            cost: self.amount(COL_COST)?,
            revenue: self.amount(COL_REVENUE)?,
            scale_status: Some(ScaleStatus::parse_or_default(
                self.get(COL_STATUS).as_deref(),
            )),
            links: OfferLinks {
                sales_page_link: self.get(COL_SALES_PAGE),
                checkout_link: self.get(COL_CHECKOUT),
                upsell_links: (1..=MAX_UPSELL_LINKS)
                    .filter_map(|n| self.get(&upsell_column(n)))
                    .collect(),
                thank_you_page_link: self.get(COL_THANK_YOU),
                drive_link: self.get(COL_DRIVE),
                ad_library_link: self.get(COL_AD_LIBRARY),
            },
            observations: self.get(COL_NOTES),
        })
    }
}

/// Parse CSV rows into validated [`NewOffer`]s.
///
/// Rows missing a required column, with unreadable numbers, or failing
/// validation are skipped. Returns the offers plus the skipped count.
pub fn parse_offers<R: Read>(input: R) -> Result<(Vec<NewOffer>, usize)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let index: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim_start_matches(UTF8_BOM).trim().to_string(), i))
        .collect();

    let mut offers = Vec::new();
    let mut skipped = 0;
    let mut rows = 0;

    for (line, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows += 1;

        let row = Row {
            index: &index,
            record: &record,
        };
        let parsed = row
            .to_new_offer()
            .and_then(|o| o.normalized().map_err(|e| e.to_string()));
        match parsed {
            Ok(offer) => offers.push(offer),
            Err(reason) => {
                // +2: header row and 1-based numbering
                warn!(line = line + 2, %reason, "skipping CSV row");
                skipped += 1;
            }
        }
    }

    if rows == 0 {
        return Err(OfferError::validation(
            "the CSV file is empty or in an invalid format",
        ));
    }
    if offers.is_empty() {
        return Err(OfferError::validation(format!(
            "no valid offers found; the columns '{COL_NAME}' and '{COL_PLATFORM}' are required"
        )));
    }

    debug!(valid = offers.len(), skipped, "parsed CSV");
    Ok((offers, skipped))
}

/// Parse `input` and insert every valid row (all-or-nothing).
pub fn import_offers<R: Read>(store: &dyn OfferStore, input: R) -> Result<ImportReport> {
    let (offers, skipped) = parse_offers(input)?;
    let inserted = store.insert_many(offers)?;
    Ok(ImportReport {
        imported: inserted.len(),
        skipped,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offers::store::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn sample_offer() -> Offer {
        NewOffer {
            name: "Curso, \"Premium\"".to_string(),
            platform: Some("Google Ads".to_string()),
            cost: Some(100.0),
            revenue: Some(350.0),
            links: OfferLinks {
                upsell_links: vec!["https://up.example/1".to_string()],
                ..OfferLinks::default()
            },
            ..NewOffer::default()
        }
        .into_offer(
            "abc".to_string(),
            Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap(),
        )
    }

    #[test]
    fn parse_decimal_variants() {
        assert_eq!(parse_decimal("150.5"), Some(150.5));
        assert_eq!(parse_decimal("150,5"), Some(150.5));
        assert_eq!(parse_decimal("1.234,50"), Some(1234.5));
        assert_eq!(parse_decimal("R$ 10,00"), Some(10.0));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("abc"), None);
    }

    #[test]
    fn export_has_bom_headers_and_derived_columns() {
        let csv = export_to_string(&[sample_offer()], &utc()).unwrap();
        assert!(csv.starts_with('\u{feff}'));

        let mut lines = csv.trim_start_matches('\u{feff}').lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("Nome da Oferta,Plataforma,Nicho,Status da Escala,Custo,Receita,Lucro,ROI"));
        assert!(header.contains("Link do Upsell 7"));

        let row = lines.next().unwrap();
        assert!(row.starts_with("\"Curso, \"\"Premium\"\"\",Google Ads,,Inicio,100.00,350.00,250.00,250.00"));
        assert!(row.contains("05/03/2024 14:30:00"));
    }

    #[test]
    fn export_then_import_keeps_fields() {
        let csv = export_to_string(&[sample_offer()], &utc()).unwrap();
        let (offers, skipped) = parse_offers(csv.as_bytes()).unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].name, "Curso, \"Premium\"");
        assert_eq!(offers[0].cost, Some(100.0));
        assert_eq!(offers[0].links.upsell_links, vec!["https://up.example/1"]);
    }

    #[test]
    fn import_skips_rows_without_required_columns() {
        let input = "Nome da Oferta,Plataforma,Custo,Status da Escala\n\
                     Oferta A,Google Ads,\"10,5\",Escalando\n\
                     ,Google Ads,1,\n\
                     Oferta C,,1,\n\
                     Oferta D,TikTok Ads,abc,\n";
        let store = MemoryStore::new();
        let report = import_offers(&store, input.as_bytes()).unwrap();
        assert_eq!(report, ImportReport { imported: 1, skipped: 3 });

        let stored = store.all().unwrap();
        assert_eq!(stored[0].cost, Some(10.5));
        assert_eq!(stored[0].scale_status, ScaleStatus::Escalando);
    }

    #[test]
    fn import_rejects_empty_and_all_invalid() {
        let store = MemoryStore::new();
        assert!(import_offers(&store, "Nome da Oferta,Plataforma\n".as_bytes()).is_err());
        assert!(import_offers(&store, "Nome da Oferta,Plataforma\nSó nome,\n".as_bytes()).is_err());
        assert!(store.all().unwrap().is_empty());
    }
}

//! Analytics engine: headline metrics, trends, daily series and category
//! rankings for a reporting window.
//!
//! Everything here is a pure function of `(offers, query)`: no IO, no clock,
//! no shared state. Callers fetch offers from an
//! [`OfferStore`](crate::offers::store::OfferStore) and pass them in.
//!
//! Category filters follow a dimension-exclusion rule so a selected bar
//! never hides its siblings:
//! - profit by platform ignores the platform filter,
//! - offers by niche and profit by niche ignore the niche filter.
//!
//! Profit by niche follows the niche chart rather than the older dashboard,
//! which applied both filters to it; a selected niche slice keeps its
//! siblings in both niche rankings.
//!
//! A window whose previous period would start before the earliest
//! representable date compares against an empty previous period.

pub mod grouping;
pub mod metrics;
pub mod period;
pub mod series;

use chrono::{FixedOffset, Offset, Utc};
use serde::Serialize;
use tracing::debug;

use crate::offers::{NO_NICHE_LABEL, NO_PLATFORM_LABEL, Offer};
use grouping::{GroupValue, group_by};
use metrics::{Metrics, Trends};
use period::{DateRange, day_of};
use series::SeriesPoint;

/// Default number of entries in the top-offers list.
pub const DEFAULT_TOP_OFFERS: usize = 5;

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// What to analyse.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsQuery {
    /// Reporting window. `None` yields the zero-state.
    pub range: Option<DateRange>,
    /// Only offers on this platform (`"N/A"` selects offers without one).
    pub platform: Option<String>,
    /// Only offers in this niche (`"N/A"` selects offers without one).
    pub niche: Option<String>,
    /// Offset used to turn `created_at` into a calendar day.
    pub utc_offset: FixedOffset,
    /// Length of the top-offers list.
    pub top_offers: usize,
}

impl Default for AnalyticsQuery {
    fn default() -> Self {
        Self {
            range: None,
            platform: None,
            niche: None,
            utc_offset: utc(),
            top_offers: DEFAULT_TOP_OFFERS,
        }
    }
}

impl AnalyticsQuery {
    pub fn for_range(range: DateRange) -> Self {
        Self {
            range: Some(range),
            ..Self::default()
        }
    }

    fn platform_filter(&self) -> Option<&str> {
        self.platform.as_deref().filter(|s| !s.is_empty())
    }

    fn niche_filter(&self) -> Option<&str> {
        self.niche.as_deref().filter(|s| !s.is_empty())
    }

    fn matches_platform(&self, offer: &Offer) -> bool {
        self.platform_filter()
            .is_none_or(|p| offer.platform_key() == p)
    }

    fn matches_niche(&self, offer: &Offer) -> bool {
        self.niche_filter().is_none_or(|n| offer.niche_key() == n)
    }
}

/// UTC as a [`FixedOffset`].
pub fn utc() -> FixedOffset {
    Utc.fix()
}

/// Build an offset from minutes east of UTC, falling back to UTC when out of
/// range.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(utc)
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Profit of one platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformProfit {
    pub platform: String,
    pub profit: f64,
}

/// Profit of one niche.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NicheProfit {
    pub niche: String,
    pub profit: f64,
}

/// Entry of the top-offers list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopOffer {
    pub id: String,
    pub name: String,
    pub platform: String,
    pub image_url: Option<String>,
    pub profit: f64,
}

/// Everything the analytics dashboard renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsData {
    pub range: Option<DateRange>,
    pub previous_range: Option<DateRange>,
    pub current_period_metrics: Metrics,
    pub previous_period_metrics: Metrics,
    pub trends: Trends,
    pub performance_over_time_data: Vec<SeriesPoint>,
    pub profit_by_platform_data: Vec<PlatformProfit>,
    pub offers_by_niche_data: Vec<GroupValue>,
    pub profit_by_niche_data: Vec<NicheProfit>,
    pub top_offers: Vec<TopOffer>,
}

impl AnalyticsData {
    /// Whether the window contained any offer at all.
    pub fn is_empty(&self) -> bool {
        self.profit_by_platform_data.is_empty() && self.offers_by_niche_data.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Compute the dashboard for `query` over `offers`.
pub fn analyze(offers: &[Offer], query: &AnalyticsQuery) -> AnalyticsData {
    let Some(range) = query.range else {
        return AnalyticsData::default();
    };
    let previous_range = range.previous();
    let tz = &query.utc_offset;

    let in_window = |window: &DateRange| -> Vec<&Offer> {
        offers
            .iter()
            .filter(|o| window.contains(day_of(&o.created_at, tz)))
            .collect()
    };
    let full_period = in_window(&range);
    let previous_period = previous_range.as_ref().map(in_window).unwrap_or_default();

    let working: Vec<&Offer> = full_period
        .iter()
        .copied()
        .filter(|o| query.matches_platform(o) && query.matches_niche(o))
        .collect();
    let niche_only: Vec<&Offer> = full_period
        .iter()
        .copied()
        .filter(|o| query.matches_niche(o))
        .collect();
    let platform_only: Vec<&Offer> = full_period
        .iter()
        .copied()
        .filter(|o| query.matches_platform(o))
        .collect();

    let current = Metrics::from_offers(working.iter().copied());
    let previous = Metrics::from_offers(previous_period.iter().copied());

    debug!(
        from = %range.from,
        to = %range.to,
        in_window = full_period.len(),
        working = working.len(),
        previous = previous_period.len(),
        "computed analytics windows"
    );

    AnalyticsData {
        range: Some(range),
        previous_range,
        current_period_metrics: current,
        previous_period_metrics: previous,
        trends: Trends::between(&current, &previous),
        performance_over_time_data: series::performance_over_time(&working, &range, tz),
        profit_by_platform_data: group_by(
            &niche_only,
            NO_PLATFORM_LABEL,
            |o| o.platform_key(),
            grouping::profit_sum,
        )
        .into_iter()
        .map(|g| PlatformProfit {
            platform: g.name,
            profit: g.value,
        })
        .collect(),
        offers_by_niche_data: group_by(
            &platform_only,
            NO_NICHE_LABEL,
            |o| o.niche_key(),
            grouping::count,
        ),
        profit_by_niche_data: group_by(
            &platform_only,
            NO_NICHE_LABEL,
            |o| o.niche_key(),
            grouping::profit_sum,
        )
        .into_iter()
        .map(|g| NicheProfit {
            niche: g.name,
            profit: g.value,
        })
        .collect(),
        top_offers: top_offers(&working, query.top_offers),
    }
}

/// Offers with recorded financials, by profit descending.
pub fn top_offers(offers: &[&Offer], limit: usize) -> Vec<TopOffer> {
    let mut ranked: Vec<&Offer> = offers
        .iter()
        .copied()
        .filter(|o| o.has_financials())
        .collect();
    ranked.sort_by(|a, b| b.profit().total_cmp(&a.profit()));
    ranked
        .into_iter()
        .take(limit)
        .map(|o| TopOffer {
            id: o.id.clone(),
            name: o.name.clone(),
            platform: o.platform_key().to_string(),
            image_url: o.image_url.clone(),
            profit: o.profit(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

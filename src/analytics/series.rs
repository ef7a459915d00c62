//! Dense daily revenue/cost series.

use std::collections::BTreeMap;

use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;

use super::period::{DateRange, day_of};
use crate::offers::Offer;

/// Display format for series labels (`dd/MM`).
pub const DAY_LABEL_FORMAT: &str = "%d/%m";

/// One day of the performance chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// `dd/MM` label for display.
    pub date: String,
    /// Full calendar day the bucket represents.
    pub day: NaiveDate,
    #[serde(rename = "Receita")]
    pub receita: f64,
    #[serde(rename = "Custo")]
    pub custo: f64,
}

/// One point per calendar day of `range`, ascending, including empty days.
///
/// Offers are bucketed by their full creation date (in `tz`), so two days
/// that share a `dd/MM` label in different years never merge. Offers outside
/// the range are ignored.
pub fn performance_over_time(
    offers: &[&Offer],
    range: &DateRange,
    tz: &FixedOffset,
) -> Vec<SeriesPoint> {
    let mut buckets: BTreeMap<NaiveDate, (f64, f64)> =
        range.days().map(|day| (day, (0.0, 0.0))).collect();

    for offer in offers {
        if let Some((revenue, cost)) = buckets.get_mut(&day_of(&offer.created_at, tz)) {
            *revenue += offer.revenue_or_zero();
            *cost += offer.cost_or_zero();
        }
    }

    buckets
        .into_iter()
        .map(|(day, (receita, custo))| SeriesPoint {
            date: day.format(DAY_LABEL_FORMAT).to_string(),
            day,
            receita,
            custo,
        })
        .collect()
}

//! Financial summaries and period-over-period change.

use serde::Serialize;

use crate::offers::{self, Offer};

/// Revenue, cost and the figures derived from them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub roi: f64,
}

impl Metrics {
    /// Sum revenue and cost over `offers` (missing values count as zero).
    pub fn from_offers<'a, I>(offers: I) -> Self
    where
        I: IntoIterator<Item = &'a Offer>,
    {
        let (revenue, cost) = offers.into_iter().fold((0.0, 0.0), |(r, c), o| {
            (r + o.revenue_or_zero(), c + o.cost_or_zero())
        });
        Self::from_totals(revenue, cost)
    }

    pub fn from_totals(revenue: f64, cost: f64) -> Self {
        let profit = offers::profit(revenue, cost);
        Self {
            revenue,
            cost,
            profit,
            roi: offers::roi(profit, cost),
        }
    }
}

/// Percentage change of each headline metric against the previous period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Trends {
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
}

impl Trends {
    pub fn between(current: &Metrics, previous: &Metrics) -> Self {
        Self {
            revenue: percentage_change(current.revenue, previous.revenue),
            cost: percentage_change(current.cost, previous.cost),
            profit: percentage_change(current.profit, previous.profit),
        }
    }
}

/// `(current - previous) / previous * 100`.
///
/// A zero baseline yields `100` when there is any growth and `0` otherwise,
/// never an infinity.
pub fn percentage_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return if current > 0.0 { 100.0 } else { 0.0 };
    }
    ((current - previous) / previous) * 100.0
}

/// Result of the standalone ROI calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoiResult {
    pub cost: f64,
    pub revenue: f64,
    pub profit: f64,
    pub roi: f64,
}

/// Profit and ROI for an ad-hoc cost/revenue pair. `None` for non-finite
/// input.
pub fn roi_calculator(cost: f64, revenue: f64) -> Option<RoiResult> {
    if !cost.is_finite() || !revenue.is_finite() {
        return None;
    }
    let m = Metrics::from_totals(revenue, cost);
    Some(RoiResult {
        cost,
        revenue,
        profit: m.profit,
        roi: m.roi,
    })
}

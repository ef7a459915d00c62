//! Group-by-category aggregation for the ranking charts.

use std::collections::HashMap;

use serde::Serialize;

use crate::offers::Offer;

/// One bar/slice of a grouped chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupValue {
    pub name: String,
    pub value: f64,
}

/// Group `items` by `key`, fold each group with `reducer` starting from 0,
/// and rank groups by value, highest first.
///
/// Empty keys are reported under `fallback`. Ties keep the order in which
/// the groups were first seen.
pub fn group_by<T, K, R>(items: &[T], fallback: &str, key: K, reducer: R) -> Vec<GroupValue>
where
    K: Fn(&T) -> &str,
    R: Fn(f64, &T) -> f64,
{
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, f64> = HashMap::new();

    for item in items {
        let raw = key(item);
        let name = if raw.is_empty() { fallback } else { raw };
        if !totals.contains_key(name) {
            order.push(name.to_string());
        }
        let acc = totals.entry(name.to_string()).or_insert(0.0);
        *acc = reducer(*acc, item);
    }

    let mut groups: Vec<GroupValue> = order
        .into_iter()
        .map(|name| {
            let value = totals.get(&name).copied().unwrap_or(0.0);
            GroupValue { name, value }
        })
        .collect();

    // sort_by is stable: equal values keep first-seen order.
    groups.sort_by(|a, b| b.value.total_cmp(&a.value));
    groups
}

/// Reducer counting offers.
pub fn count(acc: f64, _offer: &&Offer) -> f64 {
    acc + 1.0
}

/// Reducer summing `revenue - cost`.
pub fn profit_sum(acc: f64, offer: &&Offer) -> f64 {
    acc + offer.profit()
}

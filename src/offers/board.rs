//! Kanban board: offers laid out in scale-status columns.

use serde::Serialize;
use tracing::info;

use super::store::OfferStore;
use super::{Offer, ScaleStatus};
use crate::error::Result;

/// One board column.
#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub status: ScaleStatus,
    pub title: &'static str,
    pub offers: Vec<Offer>,
    /// Sum of the column's offer profits.
    pub total_profit: f64,
}

/// The full board, columns in pipeline order.
#[derive(Debug, Clone, Serialize)]
pub struct Board {
    pub columns: Vec<Column>,
}

impl Board {
    /// Place every offer in the column of its status. Input order is kept
    /// within a column.
    pub fn from_offers(offers: Vec<Offer>) -> Self {
        let mut columns: Vec<Column> = ScaleStatus::ALL
            .iter()
            .map(|&status| Column {
                status,
                title: status.title(),
                offers: Vec::new(),
                total_profit: 0.0,
            })
            .collect();

        for offer in offers {
            // ALL covers every variant, so the position always exists.
            let idx = ScaleStatus::ALL
                .iter()
                .position(|s| *s == offer.scale_status)
                .unwrap_or(0);
            columns[idx].total_profit += offer.profit();
            columns[idx].offers.push(offer);
        }

        Self { columns }
    }

    pub fn column(&self, status: ScaleStatus) -> Option<&Column> {
        self.columns.iter().find(|c| c.status == status)
    }
}

/// Outcome of a board move.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", content = "offer", rename_all = "snake_case")]
pub enum Moved {
    /// The offer was already in the target column; nothing was written.
    Unchanged(Offer),
    /// The offer's status was persisted.
    To(Offer),
}

impl Moved {
    pub fn offer(&self) -> &Offer {
        match self {
            Self::Unchanged(o) | Self::To(o) => o,
        }
    }
}

/// Move an offer to `target`, writing only when the status actually changes.
pub fn move_offer(store: &dyn OfferStore, id: &str, target: ScaleStatus) -> Result<Moved> {
    let current = store.get(id)?;
    if current.scale_status == target {
        return Ok(Moved::Unchanged(current));
    }

    let updated = store.set_status(id, target)?;
    info!(
        id = %updated.id,
        from = %current.scale_status,
        to = %target,
        "offer moved"
    );
    Ok(Moved::To(updated))
}

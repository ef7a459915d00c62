//! Activity log: one JSON line per offer mutation.
//!
//! Log file: `<data_dir>/activity.jsonl`
//!
//! Writes are best-effort. A failed append is reported through `tracing` and
//! never fails the mutation that triggered it.

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::offers::store::{OfferFilter, OfferStore};
use crate::offers::{NewOffer, Offer, OfferPatch};

/// File name of the activity log inside the data directory.
pub const ACTIVITY_FILE: &str = "activity.jsonl";

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Created,
    Updated,
    /// Scale-status change only.
    Moved,
    Deleted,
    Imported,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Moved => "moved",
            Self::Deleted => "deleted",
            Self::Imported => "imported",
        }
    }
}

/// A single line of the activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    pub kind: ActivityKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub offer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub offer_name: Option<String>,
    /// Free-form detail, e.g. `"Inicio -> Escalando"` for a move.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
}

impl ActivityEntry {
    pub fn for_offer(kind: ActivityKind, offer: &Offer) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            kind,
            offer_id: Some(offer.id.clone()),
            offer_name: Some(offer.name.clone()),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Log file
// ---------------------------------------------------------------------------

/// Append-only JSONL log. A disabled log drops every entry.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    path: Option<PathBuf>,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// `<data_dir>/activity.jsonl`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(ACTIVITY_FILE))
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append `entry`, logging (not returning) any failure.
    pub fn record(&self, entry: &ActivityEntry) {
        if let Err(e) = self.append(entry) {
            warn!(error = %e, kind = entry.kind.as_str(), "failed to append activity entry");
        }
    }

    fn append(&self, entry: &ActivityEntry) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }

    /// Every entry, oldest first. Malformed lines are skipped; a missing file
    /// reads as empty.
    pub fn read_all(&self) -> Vec<ActivityEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };
        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(std::result::Result::ok)
            .filter_map(|line| serde_json::from_str::<ActivityEntry>(&line).ok())
            .collect()
    }

    /// The last `limit` entries, newest first.
    pub fn read_recent(&self, limit: usize) -> Vec<ActivityEntry> {
        let mut entries = self.read_all();
        entries.reverse();
        entries.truncate(limit);
        entries
    }
}

// ---------------------------------------------------------------------------
// Audited store
// ---------------------------------------------------------------------------

/// Wraps an [`OfferStore`] and records every successful mutation.
pub struct AuditedStore<S> {
    inner: S,
    log: ActivityLog,
}

impl<S: OfferStore> AuditedStore<S> {
    pub fn new(inner: S, log: ActivityLog) -> Self {
        Self { inner, log }
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: OfferStore> OfferStore for AuditedStore<S> {
    fn list(&self, filter: &OfferFilter) -> Result<Vec<Offer>> {
        self.inner.list(filter)
    }

    fn get(&self, id: &str) -> Result<Offer> {
        self.inner.get(id)
    }

    fn insert(&self, offer: NewOffer) -> Result<Offer> {
        let created = self.inner.insert(offer)?;
        self.log
            .record(&ActivityEntry::for_offer(ActivityKind::Created, &created));
        Ok(created)
    }

    fn insert_many(&self, offers: Vec<NewOffer>) -> Result<Vec<Offer>> {
        let created = self.inner.insert_many(offers)?;
        self.log.record(&ActivityEntry {
            timestamp: Utc::now().to_rfc3339(),
            kind: ActivityKind::Imported,
            offer_id: None,
            offer_name: None,
            detail: Some(format!("{} offers", created.len())),
        });
        Ok(created)
    }

    fn update(&self, id: &str, patch: OfferPatch) -> Result<Offer> {
        let status_only = patch.scale_status.is_some()
            && OfferPatch {
                scale_status: None,
                ..patch.clone()
            }
            .is_empty();
        let before = if status_only {
            Some(self.inner.get(id)?.scale_status)
        } else {
            None
        };

        let updated = self.inner.update(id, patch)?;

        let entry = match before {
            Some(from) => ActivityEntry::for_offer(ActivityKind::Moved, &updated)
                .with_detail(format!("{} -> {}", from, updated.scale_status)),
            None => ActivityEntry::for_offer(ActivityKind::Updated, &updated),
        };
        self.log.record(&entry);
        Ok(updated)
    }

    fn delete(&self, id: &str) -> Result<Offer> {
        let removed = self.inner.delete(id)?;
        self.log
            .record(&ActivityEntry::for_offer(ActivityKind::Deleted, &removed));
        Ok(removed)
    }
}

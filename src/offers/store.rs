//! Offer persistence.
//!
//! [`OfferStore`] is the data-access seam: the CLI, the web API, CSV import
//! and the board all take a store instead of reaching for a global client.
//! Two implementations ship:
//!
//! - [`JsonFileStore`]: a single JSON document (`<data_dir>/offers.json`)
//!   rewritten atomically on every mutation.
//! - [`MemoryStore`]: in-process, for tests and previews.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{NewOffer, Offer, OfferPatch, ScaleStatus};
use crate::error::{OfferError, Result};

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Listing filter. Every field is optional; set fields must all match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferFilter {
    pub platform: Option<String>,
    pub niche: Option<String>,
    pub status: Option<ScaleStatus>,
    /// Case-insensitive substring match on the offer name.
    pub search: Option<String>,
}

impl OfferFilter {
    pub fn matches(&self, offer: &Offer) -> bool {
        if let Some(platform) = &self.platform
            && offer.platform.as_deref() != Some(platform.as_str())
        {
            return false;
        }
        if let Some(niche) = &self.niche
            && offer.niche.as_deref() != Some(niche.as_str())
        {
            return false;
        }
        if let Some(status) = self.status
            && offer.scale_status != status
        {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.trim().to_lowercase();
            if !needle.is_empty() && !offer.name.to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Data-access interface for offers.
pub trait OfferStore: Send + Sync {
    /// Offers matching `filter`, newest first.
    fn list(&self, filter: &OfferFilter) -> Result<Vec<Offer>>;

    fn get(&self, id: &str) -> Result<Offer>;

    /// Validate and insert a new offer, assigning `id` and `created_at`.
    fn insert(&self, offer: NewOffer) -> Result<Offer>;

    /// Insert several offers. Either all are stored or none is.
    fn insert_many(&self, offers: Vec<NewOffer>) -> Result<Vec<Offer>>;

    fn update(&self, id: &str, patch: OfferPatch) -> Result<Offer>;

    fn delete(&self, id: &str) -> Result<Offer>;

    /// Move an offer to another pipeline stage.
    fn set_status(&self, id: &str, status: ScaleStatus) -> Result<Offer> {
        self.update(id, OfferPatch::status(status))
    }

    /// Every stored offer, newest first.
    fn all(&self) -> Result<Vec<Offer>> {
        self.list(&OfferFilter::default())
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Validate a batch up front so a bad row aborts before anything is stored.
fn build_offers(offers: Vec<NewOffer>) -> Result<Vec<Offer>> {
    let now = Utc::now();
    offers
        .into_iter()
        .map(|o| Ok(o.normalized()?.into_offer(new_id(), now)))
        .collect()
}

fn newest_first(mut offers: Vec<Offer>, filter: &OfferFilter) -> Vec<Offer> {
    offers.retain(|o| filter.matches(o));
    offers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    offers
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Mutex-guarded vector of offers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    offers: Mutex<Vec<Offer>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with pre-built records (ids and timestamps kept as given).
    pub fn with_offers(offers: Vec<Offer>) -> Self {
        Self {
            offers: Mutex::new(offers),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Offer>> {
        // A panic while holding the lock cannot leave a half-written Vec.
        self.offers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl OfferStore for MemoryStore {
    fn list(&self, filter: &OfferFilter) -> Result<Vec<Offer>> {
        Ok(newest_first(self.lock().clone(), filter))
    }

    fn get(&self, id: &str) -> Result<Offer> {
        self.lock()
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| OfferError::NotFound(id.to_string()))
    }

    fn insert(&self, offer: NewOffer) -> Result<Offer> {
        let offer = offer.normalized()?.into_offer(new_id(), Utc::now());
        self.lock().push(offer.clone());
        Ok(offer)
    }

    fn insert_many(&self, offers: Vec<NewOffer>) -> Result<Vec<Offer>> {
        let built = build_offers(offers)?;
        self.lock().extend(built.iter().cloned());
        Ok(built)
    }

    fn update(&self, id: &str, patch: OfferPatch) -> Result<Offer> {
        let mut offers = self.lock();
        let slot = offers
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| OfferError::NotFound(id.to_string()))?;
        *slot = patch.apply(slot)?;
        Ok(slot.clone())
    }

    fn delete(&self, id: &str) -> Result<Offer> {
        let mut offers = self.lock();
        let pos = offers
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| OfferError::NotFound(id.to_string()))?;
        Ok(offers.remove(pos))
    }
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// On-disk document layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct OfferDocument {
    #[serde(default)]
    offers: Vec<Offer>,
}

/// Offers persisted as one pretty-printed JSON document.
///
/// Every call reads the file fresh, so a CLI command and the web dashboard
/// can run side by side. Writes go to a sibling temp file that is then
/// renamed over the original.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store at `<data_dir>/offers.json`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("offers.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<Offer>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let doc: OfferDocument = serde_json::from_str(&content)?;
        debug!(path = %self.path.display(), count = doc.offers.len(), "loaded offers");
        Ok(doc.offers)
    }

    fn save(&self, offers: Vec<Offer>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let doc = OfferDocument { offers };
        let json = serde_json::to_string_pretty(&doc)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Run a read-modify-write cycle under the process-local write lock.
    fn mutate<T>(&self, f: impl FnOnce(&mut Vec<Offer>) -> Result<T>) -> Result<T> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut offers = self.load()?;
        let out = f(&mut offers)?;
        self.save(offers)?;
        Ok(out)
    }
}

impl OfferStore for JsonFileStore {
    fn list(&self, filter: &OfferFilter) -> Result<Vec<Offer>> {
        Ok(newest_first(self.load()?, filter))
    }

    fn get(&self, id: &str) -> Result<Offer> {
        self.load()?
            .into_iter()
            .find(|o| o.id == id)
            .ok_or_else(|| OfferError::NotFound(id.to_string()))
    }

    fn insert(&self, offer: NewOffer) -> Result<Offer> {
        let offer = offer.normalized()?.into_offer(new_id(), Utc::now());
        self.mutate(|offers| {
            offers.push(offer.clone());
            Ok(())
        })?;
        info!(id = %offer.id, name = %offer.name, "offer created");
        Ok(offer)
    }

    fn insert_many(&self, offers: Vec<NewOffer>) -> Result<Vec<Offer>> {
        let built = build_offers(offers)?;
        self.mutate(|offers| {
            offers.extend(built.iter().cloned());
            Ok(())
        })?;
        info!(count = built.len(), "offers inserted");
        Ok(built)
    }

    fn update(&self, id: &str, patch: OfferPatch) -> Result<Offer> {
        let updated = self.mutate(|offers| {
            let slot = offers
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or_else(|| OfferError::NotFound(id.to_string()))?;
            *slot = patch.apply(slot)?;
            Ok(slot.clone())
        })?;
        info!(id = %updated.id, "offer updated");
        Ok(updated)
    }

    fn delete(&self, id: &str) -> Result<Offer> {
        let removed = self.mutate(|offers| {
            let pos = offers
                .iter()
                .position(|o| o.id == id)
                .ok_or_else(|| OfferError::NotFound(id.to_string()))?;
            Ok(offers.remove(pos))
        })?;
        info!(id = %removed.id, "offer deleted");
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Link Store for LinkDeck.
//!
//! Owns the canonical `(links, categories)` snapshot. Every command computes
//! the next snapshot through the ordering engine, swaps it in whole and
//! writes it to the key-value store before returning.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::kv_store::{KeyValueStore, DATA_KEY};
use crate::services::ordering::{self, MergeOutcome};
use crate::types::errors::StoreError;
use crate::types::link::{
    default_categories, initial_links, normalize_url, Category, DataSnapshot, Link, LinkDraft,
    LinkUpdate, ReorderScope, ALL_CATEGORIES_ID, COMMON_CATEGORY_ID,
};

/// Current UNIX time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

pub(crate) fn require_title(title: &str) -> Result<String, StoreError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(StoreError::InvalidLink("title must not be empty".to_string()));
    }
    Ok(title.to_string())
}

pub(crate) fn require_url(url: &str) -> Result<String, StoreError> {
    normalize_url(url).ok_or_else(|| StoreError::InvalidLink("url must not be empty".to_string()))
}

/// Trait defining the link store command surface.
pub trait LinkStoreTrait {
    fn add_link(&mut self, draft: LinkDraft) -> Result<String, StoreError>;
    fn update_link(&mut self, update: LinkUpdate) -> Result<(), StoreError>;
    fn delete_link(&mut self, id: &str) -> Result<(), StoreError>;
    fn toggle_pin(&mut self, id: &str) -> Result<(), StoreError>;
    fn reorder_links(&mut self, active_id: &str, over_id: &str, category_id: &str) -> Result<(), StoreError>;
    fn reorder_pinned_links(&mut self, active_id: &str, over_id: &str) -> Result<(), StoreError>;
    fn add_category(&mut self, name: &str, icon: &str) -> Result<String, StoreError>;
    fn update_category(&mut self, category: Category) -> Result<(), StoreError>;
    fn delete_category(&mut self, id: &str) -> Result<(), StoreError>;
    fn import_data(&mut self, links: Vec<Link>, categories: Vec<Category>) -> Result<ImportSummary, StoreError>;
    fn links(&self) -> &[Link];
    fn categories(&self) -> &[Category];
}

/// Where the current snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Read and repaired from the key-value store.
    Persisted,
    /// Nothing stored yet; seed data in use.
    Seeded,
    /// Stored data was unreadable; seed data in use.
    Recovered,
}

/// What a load-time repair pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub common_fixed: bool,
    pub orphans_reassigned: usize,
}

/// Counts reported back to the caller of `import_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub links_added: usize,
    pub categories_added: usize,
    pub ids_reassigned: usize,
    /// Imported links dropped for an empty title or url.
    pub links_skipped: usize,
}

impl From<&MergeOutcome> for ImportSummary {
    fn from(outcome: &MergeOutcome) -> Self {
        Self {
            links_added: outcome.links_added,
            categories_added: outcome.categories_added,
            ids_reassigned: outcome.ids_reassigned,
            links_skipped: 0,
        }
    }
}

/// Normalizes url and title of imported links, dropping the ones left empty.
fn sanitize_imported(links: Vec<Link>) -> (Vec<Link>, usize) {
    let total = links.len();
    let kept: Vec<Link> = links
        .into_iter()
        .filter_map(|mut link| {
            link.url = require_url(&link.url).ok()?;
            link.title = require_title(&link.title).ok()?;
            Some(link)
        })
        .collect();
    let skipped = total - kept.len();
    (kept, skipped)
}

/// The authoritative link collection, persisted through a [`KeyValueStore`].
pub struct LinkStore<S: KeyValueStore> {
    kv: S,
    links: Vec<Link>,
    categories: Vec<Category>,
    source: LoadSource,
    dirty: bool,
}

impl<S: KeyValueStore> LinkStore<S> {
    /// Creates a store over `kv` and loads the persisted snapshot.
    pub fn open(kv: S) -> Self {
        let mut store = Self {
            kv,
            links: Vec::new(),
            categories: Vec::new(),
            source: LoadSource::Seeded,
            dirty: false,
        };
        store.load();
        store
    }

    /// Replaces the in-memory snapshot with the persisted one.
    ///
    /// Absent or unreadable data falls back to the seed set. The result is
    /// always repaired: `common` exists and is first, orphans point at
    /// `common`, and pinned ranks are contiguous.
    pub fn load(&mut self) -> LoadSource {
        let (snapshot, source) = match self.kv.get(DATA_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<DataSnapshot>(&raw) {
                Ok(snapshot) => (snapshot, LoadSource::Persisted),
                Err(e) => {
                    warn!(error = %e, "stored link snapshot is corrupt, using defaults");
                    (Self::seed(), LoadSource::Recovered)
                }
            },
            Ok(None) => (Self::seed(), LoadSource::Seeded),
            Err(e) => {
                warn!(error = %e, "failed to read link snapshot, using defaults");
                (Self::seed(), LoadSource::Recovered)
            }
        };

        let (snapshot, report) = Self::repair(snapshot);
        if report.common_fixed {
            warn!("common category was missing or misplaced, restored at index 0");
        }
        if report.orphans_reassigned > 0 {
            warn!(count = report.orphans_reassigned, "reassigned orphaned links to common");
        }

        info!(
            ?source,
            links = snapshot.links.len(),
            categories = snapshot.categories.len(),
            "link store loaded"
        );
        self.links = snapshot.links;
        self.categories = snapshot.categories;
        self.source = source;
        self.dirty = false;
        source
    }

    /// Applies the load-time invariants to an arbitrary snapshot.
    pub fn repair(snapshot: DataSnapshot) -> (DataSnapshot, RepairReport) {
        let categories = if snapshot.categories.is_empty() {
            default_categories()
        } else {
            snapshot.categories
        };
        let (categories, common_fixed) = ordering::ensure_common_first(&categories);

        let mut links = snapshot.links;
        let orphans_reassigned = ordering::reassign_orphans(&mut links, &categories);
        ordering::compact_pinned_orders(&mut links);
        ordering::sort_links(&mut links);

        (
            DataSnapshot { links, categories },
            RepairReport {
                common_fixed,
                orphans_reassigned,
            },
        )
    }

    fn seed() -> DataSnapshot {
        DataSnapshot {
            links: initial_links(),
            categories: default_categories(),
        }
    }

    pub fn source(&self) -> LoadSource {
        self.source
    }

    /// True if the last write failed and memory is ahead of the store.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns a copy of the current snapshot.
    pub fn snapshot(&self) -> DataSnapshot {
        DataSnapshot {
            links: self.links.clone(),
            categories: self.categories.clone(),
        }
    }

    /// Non-pinned links of `category_id` in presentation order; `"all"` selects every category.
    pub fn links_in_category(&self, category_id: &str) -> Vec<Link> {
        let scope = ReorderScope::for_category(category_id);
        let mut links: Vec<Link> = self.links.iter().filter(|l| scope.contains(l)).cloned().collect();
        ordering::sort_links(&mut links);
        links
    }

    /// Pinned links ranked by `pinned_order`.
    pub fn pinned_links(&self) -> Vec<Link> {
        let mut links: Vec<Link> = self.links.iter().filter(|l| l.pinned).cloned().collect();
        ordering::sort_links(&mut links);
        links
    }

    /// Pretty JSON of the snapshot, for backup collaborators.
    pub fn export_json(&self) -> Result<String, StoreError> {
        serde_json::to_string_pretty(&self.snapshot()).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Re-writes the current snapshot after a failed write.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.persist()
    }

    /// Swaps in the next snapshot, then persists it.
    fn commit(&mut self, links: Vec<Link>, categories: Vec<Category>) -> Result<(), StoreError> {
        self.links = links;
        self.categories = categories;
        self.persist()
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&DataSnapshot {
            links: self.links.clone(),
            categories: self.categories.clone(),
        })
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

        match self.kv.set(DATA_KEY, &json) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                warn!(error = %e, "failed to persist link snapshot");
                Err(e.into())
            }
        }
    }

    fn category_exists(&self, id: &str) -> bool {
        self.categories.iter().any(|c| c.id == id)
    }

    /// Resolves a requested category, falling back to `common` when unknown.
    fn resolve_category(&self, requested: Option<&str>) -> String {
        match requested {
            Some(id) if self.category_exists(id) => id.to_string(),
            Some(id) => {
                if id != ALL_CATEGORIES_ID {
                    warn!(category = id, "unknown category, using common");
                }
                COMMON_CATEGORY_ID.to_string()
            }
            None => COMMON_CATEGORY_ID.to_string(),
        }
    }
}

impl<S: KeyValueStore> LinkStoreTrait for LinkStore<S> {
    /// Creates a link and returns its new id.
    fn add_link(&mut self, draft: LinkDraft) -> Result<String, StoreError> {
        let link = Link {
            id: Uuid::new_v4().to_string(),
            url: require_url(&draft.url)?,
            title: require_title(&draft.title)?,
            description: draft.description.filter(|d| !d.is_empty()),
            category_id: self.resolve_category(draft.category_id.as_deref()),
            icon: draft.icon.filter(|i| !i.is_empty()),
            pinned: draft.pinned,
            order: None,
            pinned_order: None,
            created_at: now_millis(),
        };
        let id = link.id.clone();
        debug!(id = %id, category = %link.category_id, pinned = link.pinned, "adding link");

        let links = ordering::insert(&self.links, link);
        let categories = self.categories.clone();
        self.commit(links, categories)?;
        Ok(id)
    }

    /// Merges `update` over the existing record and replaces it.
    fn update_link(&mut self, update: LinkUpdate) -> Result<(), StoreError> {
        let index = self
            .links
            .iter()
            .position(|l| l.id == update.id)
            .ok_or_else(|| StoreError::LinkNotFound(update.id.clone()))?;

        let mut link = self.links[index].clone();
        if let Some(url) = update.url.as_deref() {
            link.url = url.to_string();
        }
        link.url = require_url(&link.url)?;
        if let Some(title) = update.title.as_deref() {
            link.title = require_title(title)?;
        }
        if let Some(description) = update.description {
            link.description = Some(description).filter(|d| !d.is_empty());
        }
        if let Some(icon) = update.icon {
            link.icon = Some(icon).filter(|i| !i.is_empty());
        }
        if let Some(category_id) = update.category_id.as_deref() {
            link.category_id = self.resolve_category(Some(category_id));
        }
        let pin_changed = update.pinned.is_some_and(|p| p != link.pinned);

        let mut links = self.links.clone();
        links[index] = link;
        if pin_changed {
            links = ordering::toggle_pin(&links, &update.id)
                .ok_or_else(|| StoreError::LinkNotFound(update.id.clone()))?;
        }
        debug!(id = %update.id, pin_changed, "updated link");

        let categories = self.categories.clone();
        self.commit(links, categories)
    }

    fn delete_link(&mut self, id: &str) -> Result<(), StoreError> {
        let links = ordering::remove(&self.links, id).ok_or_else(|| StoreError::LinkNotFound(id.to_string()))?;
        debug!(id, "deleted link");
        let categories = self.categories.clone();
        self.commit(links, categories)
    }

    fn toggle_pin(&mut self, id: &str) -> Result<(), StoreError> {
        let links = ordering::toggle_pin(&self.links, id).ok_or_else(|| StoreError::LinkNotFound(id.to_string()))?;
        let categories = self.categories.clone();
        self.commit(links, categories)
    }

    /// Drag-reorders non-pinned links inside `category_id` (or `"all"`).
    ///
    /// Equal or out-of-scope ids leave the store untouched.
    fn reorder_links(&mut self, active_id: &str, over_id: &str, category_id: &str) -> Result<(), StoreError> {
        let scope = ReorderScope::for_category(category_id);
        let links = ordering::reorder(&self.links, active_id, over_id, &scope);
        if links == self.links {
            debug!(active_id, over_id, category_id, "reorder was a no-op");
            return Ok(());
        }
        let categories = self.categories.clone();
        self.commit(links, categories)
    }

    fn reorder_pinned_links(&mut self, active_id: &str, over_id: &str) -> Result<(), StoreError> {
        let links = ordering::reorder(&self.links, active_id, over_id, &ReorderScope::Pinned);
        if links == self.links {
            debug!(active_id, over_id, "pinned reorder was a no-op");
            return Ok(());
        }
        let categories = self.categories.clone();
        self.commit(links, categories)
    }

    fn add_category(&mut self, name: &str, icon: &str) -> Result<String, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::ForbiddenOperation("category name must not be empty".to_string()));
        }
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
        };
        let id = category.id.clone();
        let mut categories = self.categories.clone();
        categories.push(category);
        let links = self.links.clone();
        self.commit(links, categories)?;
        Ok(id)
    }

    /// Renames or re-icons a category. Its id and position never change.
    fn update_category(&mut self, category: Category) -> Result<(), StoreError> {
        let index = self
            .categories
            .iter()
            .position(|c| c.id == category.id)
            .ok_or_else(|| StoreError::CategoryNotFound(category.id.clone()))?;
        if category.name.trim().is_empty() {
            return Err(StoreError::ForbiddenOperation("category name must not be empty".to_string()));
        }
        let mut categories = self.categories.clone();
        categories[index] = category;
        let links = self.links.clone();
        self.commit(links, categories)
    }

    /// Deletes a category and moves its links to `common`.
    ///
    /// Deleting `common` is rejected with [`StoreError::ForbiddenOperation`].
    fn delete_category(&mut self, id: &str) -> Result<(), StoreError> {
        let (links, categories) = match ordering::cascade_category_delete(&self.links, &self.categories, id) {
            Ok(next) => next,
            Err(e) => {
                info!(category = id, error = %e, "category delete rejected");
                return Err(e);
            }
        };
        info!(category = id, "category deleted");
        self.commit(links, categories)
    }

    fn import_data(&mut self, links: Vec<Link>, categories: Vec<Category>) -> Result<ImportSummary, StoreError> {
        let (links, links_skipped) = sanitize_imported(links);
        let outcome = ordering::merge(&self.links, &self.categories, &links, &categories, || {
            Uuid::new_v4().to_string()
        });
        let summary = ImportSummary {
            links_skipped,
            ..ImportSummary::from(&outcome)
        };
        info!(
            links = summary.links_added,
            categories = summary.categories_added,
            ids_reassigned = summary.ids_reassigned,
            skipped = summary.links_skipped,
            "imported data"
        );
        self.commit(outcome.links, outcome.categories)?;
        Ok(summary)
    }

    fn links(&self) -> &[Link] {
        &self.links
    }

    fn categories(&self) -> &[Category] {
        &self.categories
    }
}

//! Item catalog store.
//!
//! Append-only: items are written to disk before they are published in
//! memory, and the in-memory lock is held only for the append itself.

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::RwLock;

use crate::error::{MarketError, Result};
use crate::identity::UserId;
use crate::storage::{is_file_safe, RecordDir};

use super::item::{Item, ItemId, NewItem};

#[derive(Default)]
struct CatalogState {
    items: HashMap<ItemId, Item>,
    /// Publication order across all owners.
    order: Vec<ItemId>,
    by_owner: HashMap<UserId, Vec<ItemId>>,
}

impl CatalogState {
    fn append(&mut self, item: Item) {
        self.order.push(item.id.clone());
        self.by_owner
            .entry(item.owner.clone())
            .or_default()
            .push(item.id.clone());
        self.items.insert(item.id.clone(), item);
    }

    fn collect(&self, ids: &[ItemId]) -> Vec<Item> {
        ids.iter()
            .filter_map(|id| self.items.get(id))
            .cloned()
            .collect()
    }
}

/// Concurrent, optionally file-backed item catalog.
pub struct ItemCatalog {
    state: RwLock<CatalogState>,
    records: Option<RecordDir<Item>>,
}

impl ItemCatalog {
    /// Empty, non-persistent catalog.
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(CatalogState::default()),
            records: None,
        }
    }

    /// Open a file-backed catalog, restoring publication order.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let records = RecordDir::open(base_dir)?;
        let mut items: Vec<Item> = records.load_all()?;
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let mut state = CatalogState::default();
        for item in items {
            state.append(item);
        }
        log::debug!("loaded {} items", state.items.len());

        Ok(Self {
            state: RwLock::new(state),
            records: Some(records),
        })
    }

    /// Validate and publish a new item, returning the stored record.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an empty title, negative price or bad coordinates;
    /// a storage error if persisting fails.
    pub fn publish(&self, new_item: NewItem) -> Result<Item> {
        let item = new_item.into_item()?;

        if let Some(records) = &self.records {
            records.save(&item.id.0, &item)?;
        }
        log::info!("{} published {} ({})", item.owner, item.id, item.title);

        self.state.write().append(item.clone());
        Ok(item)
    }

    pub fn get(&self, id: &ItemId) -> Option<Item> {
        self.state.read().items.get(id).cloned()
    }

    /// Like [`get`](Self::get) but a missing item is `NotFound`.
    ///
    /// A file-backed catalog also checks the items directory, so items
    /// another handle published after this one was opened are found.
    pub fn require(&self, id: &ItemId) -> Result<Item> {
        if let Some(item) = self.get(id) {
            return Ok(item);
        }
        self.load_unseen(id)?
            .ok_or_else(|| MarketError::NotFound(format!("item not found: {id}")))
    }

    fn load_unseen(&self, id: &ItemId) -> Result<Option<Item>> {
        let Some(records) = &self.records else {
            return Ok(None);
        };
        if !is_file_safe(&id.0) {
            return Ok(None);
        }
        let Some(item) = records.try_load(&id.0)? else {
            return Ok(None);
        };
        let mut state = self.state.write();
        if !state.items.contains_key(&item.id) {
            state.append(item.clone());
        }
        Ok(Some(item))
    }

    /// The owner's items in publication order.
    pub fn list_by_owner(&self, owner: &UserId) -> Vec<Item> {
        let state = self.state.read();
        state
            .by_owner
            .get(owner)
            .map(|ids| state.collect(ids))
            .unwrap_or_default()
    }

    /// Every item in publication order.
    pub fn list_all(&self) -> Vec<Item> {
        let state = self.state.read();
        state.collect(&state.order)
    }

    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().items.is_empty()
    }
}

//! Discovery — items annotated with the viewer's handshake level to owners.
//!
//! Levels are computed at query time, once per distinct owner, and never
//! stored. Discovery is best-effort: if a level cannot be resolved for one
//! owner, that owner's items are shown at [`HandshakeLevel::None`] and the
//! listing carries on.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{Item, ItemCatalog};
use crate::error::Result;
use crate::identity::UserId;
use crate::trust::{HandshakeLevel, TrustGraph};

/// Anything that can answer "how far is `target` from `viewer`".
pub trait HandshakeSource: Send + Sync {
    fn handshake_level(&self, viewer: &UserId, target: &UserId) -> Result<HandshakeLevel>;
}

impl HandshakeSource for TrustGraph {
    fn handshake_level(&self, viewer: &UserId, target: &UserId) -> Result<HandshakeLevel> {
        Ok(TrustGraph::handshake_level(self, viewer, target))
    }
}

/// An item as seen by a particular viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleItem {
    pub item: Item,
    pub handshake_level: HandshakeLevel,
    /// The viewer owns this item. Independent of `handshake_level`.
    pub is_own_item: bool,
}

/// Joins the catalog with trust distances for a viewer.
pub struct DiscoveryAggregator {
    catalog: Arc<ItemCatalog>,
    trust: Arc<dyn HandshakeSource>,
}

impl DiscoveryAggregator {
    pub fn new(catalog: Arc<ItemCatalog>, trust: Arc<dyn HandshakeSource>) -> Self {
        Self { catalog, trust }
    }

    /// Every item in catalog order, annotated for `viewer`.
    pub fn list_visible_items(&self, viewer: &UserId) -> Vec<VisibleItem> {
        let items = self.catalog.list_all();
        let mut levels: HashMap<UserId, HandshakeLevel> = HashMap::new();

        items
            .into_iter()
            .map(|item| {
                let level = *levels
                    .entry(item.owner.clone())
                    .or_insert_with(|| self.resolve(viewer, &item.owner));
                VisibleItem {
                    is_own_item: item.is_owned_by(viewer),
                    handshake_level: level,
                    item,
                }
            })
            .collect()
    }

    /// Like [`list_visible_items`](Self::list_visible_items) but closest
    /// owners first; unreachable owners last. Catalog order within a level.
    pub fn rank_visible_items(&self, viewer: &UserId) -> Vec<VisibleItem> {
        let mut items = self.list_visible_items(viewer);
        items.sort_by_key(|v| v.handshake_level.closeness_rank());
        items
    }

    fn resolve(&self, viewer: &UserId, owner: &UserId) -> HandshakeLevel {
        match self.trust.handshake_level(viewer, owner) {
            Ok(level) => level,
            Err(e) => {
                log::warn!("handshake level {viewer} -> {owner} unavailable: {e}");
                HandshakeLevel::None
            }
        }
    }
}

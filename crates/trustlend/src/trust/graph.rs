//! Trust graph store.
//!
//! Holds every trust edge plus forward and reverse adjacency lists kept in
//! insertion order.
//!
//! Writes are serialized per ordered pair: a striped mutex keyed by the edge
//! id covers check, persist and publish, so two concurrent submissions of
//! the same pair produce one edge. A file-backed graph also holds the
//! edge's lock file across the check and the write. The shared state lock
//! is only taken exclusively to link or unlink an edge in memory, so reads
//! never wait on the filesystem.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use parking_lot::{Mutex, RwLock};

use crate::error::{MarketError, Result};
use crate::identity::UserId;
use crate::storage::RecordDir;

const PAIR_LOCK_STRIPES: usize = 64;

use super::edge::{EdgeId, TrustEdge, TrustStrength};
use super::handshake::{self, HandshakeLevel, TrustAdjacency};

#[derive(Default)]
struct GraphState {
    edges: HashMap<EdgeId, TrustEdge>,
    outgoing: HashMap<UserId, Vec<UserId>>,
    incoming: HashMap<UserId, Vec<UserId>>,
}

impl GraphState {
    fn link(&mut self, edge: TrustEdge) {
        self.outgoing
            .entry(edge.follower.clone())
            .or_default()
            .push(edge.following.clone());
        self.incoming
            .entry(edge.following.clone())
            .or_default()
            .push(edge.follower.clone());
        self.edges.insert(edge.id.clone(), edge);
    }

    fn link_if_absent(&mut self, edge: TrustEdge) {
        if !self.edges.contains_key(&edge.id) {
            self.link(edge);
        }
    }

    fn unlink(&mut self, follower: &UserId, following: &UserId) {
        if let Some(list) = self.outgoing.get_mut(follower) {
            list.retain(|u| u != following);
        }
        if let Some(list) = self.incoming.get_mut(following) {
            list.retain(|u| u != follower);
        }
        self.edges.remove(&EdgeId::for_pair(follower, following));
    }
}

impl TrustAdjacency for GraphState {
    fn outgoing(&self, user: &UserId) -> &[UserId] {
        self.outgoing.outgoing(user)
    }
}

/// Concurrent, optionally file-backed trust graph.
pub struct TrustGraph {
    state: RwLock<GraphState>,
    pair_locks: Vec<Mutex<()>>,
    records: Option<RecordDir<TrustEdge>>,
}

impl TrustGraph {
    /// Empty, non-persistent graph.
    pub fn in_memory() -> Self {
        Self::with_state(GraphState::default(), None)
    }

    fn with_state(state: GraphState, records: Option<RecordDir<TrustEdge>>) -> Self {
        Self {
            state: RwLock::new(state),
            pair_locks: (0..PAIR_LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
            records,
        }
    }

    /// Open a file-backed graph, replaying stored edges in creation order.
    ///
    /// # Errors
    ///
    /// Storage errors from the record directory, or `InvalidFileFormat` if a
    /// stored edge is a self-edge or is filed under the wrong id.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let records = RecordDir::open(base_dir)?;
        let mut edges: Vec<TrustEdge> = records.load_all()?;
        edges.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.0.cmp(&b.id.0)));

        let mut state = GraphState::default();
        for edge in edges {
            if edge.follower == edge.following
                || edge.id != EdgeId::for_pair(&edge.follower, &edge.following)
            {
                return Err(MarketError::InvalidFileFormat(format!(
                    "corrupt trust edge record {}",
                    edge.id
                )));
            }
            state.link(edge);
        }
        log::debug!("loaded {} trust edges", state.edges.len());

        Ok(Self::with_state(state, Some(records)))
    }

    // ── Writes ────────────────────────────────────────────────────────────────

    /// Record that `follower` trusts `following`.
    ///
    /// Idempotent: if the pair already exists the stored edge is returned
    /// unchanged, including its original strength.
    ///
    /// # Errors
    ///
    /// `InvalidEdge` for self-trust, or a storage error if persisting fails.
    pub fn add_edge(
        &self,
        follower: &UserId,
        following: &UserId,
        strength: TrustStrength,
    ) -> Result<TrustEdge> {
        let edge = TrustEdge::new(follower.clone(), following.clone(), strength)?;
        let _pair = self.pair_lock(&edge.id).lock();

        if let Some(existing) = self.state.read().edges.get(&edge.id) {
            log::debug!("trust edge {} already present", existing.id);
            return Ok(existing.clone());
        }

        if let Some(records) = &self.records {
            let _file_lock = records.lock(&edge.id.0)?;
            if let Some(stored) = records.try_load(&edge.id.0)? {
                log::debug!("trust edge {} was written by another handle", stored.id);
                self.state.write().link_if_absent(stored.clone());
                return Ok(stored);
            }
            records.save(&edge.id.0, &edge)?;
        }
        log::info!("{} now trusts {} ({})", edge.follower, edge.following, edge.id);
        self.state.write().link(edge.clone());
        Ok(edge)
    }

    /// Remove the edge `follower → following`. Returns whether it existed.
    pub fn revoke_edge(&self, follower: &UserId, following: &UserId) -> Result<bool> {
        let id = EdgeId::for_pair(follower, following);
        let _pair = self.pair_lock(&id).lock();

        // On disk the record file is authoritative; a stale in-memory edge
        // is still dropped.
        let known = self.state.read().edges.contains_key(&id);
        let existed = match &self.records {
            Some(records) => {
                let _file_lock = records.lock(&id.0)?;
                records.remove(&id.0)?
            }
            None => known,
        };

        if known {
            self.state.write().unlink(follower, following);
        }
        if existed {
            log::info!("{follower} revoked trust in {following}");
        }
        Ok(existed)
    }

    fn pair_lock(&self, id: &EdgeId) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        &self.pair_locks[(hasher.finish() as usize) % self.pair_locks.len()]
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    /// Users `user` trusts directly, in the order the edges were added.
    pub fn outgoing(&self, user: &UserId) -> Vec<UserId> {
        self.state.read().outgoing.outgoing(user).to_vec()
    }

    /// Users who trust `user` directly, in the order the edges were added.
    pub fn incoming(&self, user: &UserId) -> Vec<UserId> {
        self.state.read().incoming.outgoing(user).to_vec()
    }

    /// Look up the edge for an ordered pair.
    pub fn edge(&self, follower: &UserId, following: &UserId) -> Option<TrustEdge> {
        self.state
            .read()
            .edges
            .get(&EdgeId::for_pair(follower, following))
            .cloned()
    }

    /// Shortest-distance handshake level from `viewer` to `target`.
    pub fn handshake_level(&self, viewer: &UserId, target: &UserId) -> HandshakeLevel {
        handshake::handshake_level(&*self.state.read(), viewer, target)
    }

    /// Shortest path of at most three hops, `[viewer, .., target]`.
    pub fn trust_path(&self, viewer: &UserId, target: &UserId) -> Option<Vec<UserId>> {
        handshake::shortest_trust_path(&*self.state.read(), viewer, target)
    }

    /// Total number of edges.
    pub fn len(&self) -> usize {
        self.state.read().edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().edges.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

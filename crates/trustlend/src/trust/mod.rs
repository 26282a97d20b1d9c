//! Trust graph — directed follow edges and bounded handshake distance.
//!
//! The trust module provides:
//! - Directed, idempotent, revocable trust edges
//! - A concurrent graph store with insertion-ordered adjacency
//! - Handshake levels: shortest follow distance capped at three hops

pub mod edge;
pub mod graph;
pub mod handshake;

pub use edge::{EdgeId, TrustEdge, TrustStrength};
pub use graph::TrustGraph;
pub use handshake::{
    handshake_level, shortest_trust_path, HandshakeLevel, TrustAdjacency, MAX_HANDSHAKE_DEPTH,
};

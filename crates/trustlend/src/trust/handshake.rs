//! Handshake levels — bounded shortest trust distance between two users.
//!
//! The search is a breadth-first walk over outgoing edges from the viewer.
//! It stops as soon as the target is seen and never expands past
//! [`MAX_HANDSHAKE_DEPTH`] hops, so the work is bounded by the branching
//! factor cubed no matter how large or cyclic the graph is.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::identity::UserId;

/// Maximum number of hops a handshake may span.
pub const MAX_HANDSHAKE_DEPTH: usize = 3;

/// Shortest trust distance from a viewer to a target, capped at three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum HandshakeLevel {
    /// No path within the bound.
    None = 0,
    /// The viewer follows the target.
    Direct = 1,
    /// One intermediate user.
    SecondDegree = 2,
    /// Two intermediate users.
    ThirdDegree = 3,
}

impl HandshakeLevel {
    /// Level for a path of `hops` edges; anything outside 1..=3 is `None`.
    pub fn from_hops(hops: usize) -> Self {
        match hops {
            1 => Self::Direct,
            2 => Self::SecondDegree,
            3 => Self::ThirdDegree,
            _ => Self::None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Hop count, or `None` when unreachable.
    pub fn distance(self) -> Option<u8> {
        match self {
            Self::None => None,
            other => Some(other as u8),
        }
    }

    pub fn is_connected(self) -> bool {
        self != Self::None
    }

    /// Sort key where closer levels come first and `None` comes last.
    pub fn closeness_rank(self) -> u8 {
        match self {
            Self::None => u8::MAX,
            other => other as u8,
        }
    }

    /// Stable label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Direct => "direct",
            Self::SecondDegree => "friend-of-friend",
            Self::ThirdDegree => "third-degree",
        }
    }
}

impl std::fmt::Display for HandshakeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HandshakeLevel> for u8 {
    fn from(level: HandshakeLevel) -> u8 {
        level.as_u8()
    }
}

impl TryFrom<u8> for HandshakeLevel {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, String> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Direct),
            2 => Ok(Self::SecondDegree),
            3 => Ok(Self::ThirdDegree),
            other => Err(format!("handshake level out of range: {other}")),
        }
    }
}

/// Outgoing adjacency of a trust graph.
pub trait TrustAdjacency {
    /// Users directly trusted by `user`, in insertion order.
    fn outgoing(&self, user: &UserId) -> &[UserId];
}

impl TrustAdjacency for HashMap<UserId, Vec<UserId>> {
    fn outgoing(&self, user: &UserId) -> &[UserId] {
        self.get(user).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Find a shortest path of at most [`MAX_HANDSHAKE_DEPTH`] hops.
///
/// Returns the full path `[viewer, .., target]`. When `viewer == target` a
/// path is found only through a cycle of two or more hops; the trivial
/// zero-hop path does not count.
pub fn shortest_trust_path(
    graph: &impl TrustAdjacency,
    viewer: &UserId,
    target: &UserId,
) -> Option<Vec<UserId>> {
    let mut visited: HashSet<&UserId> = HashSet::new();
    let mut parent: HashMap<&UserId, &UserId> = HashMap::new();
    visited.insert(viewer);

    let mut frontier: Vec<&UserId> = vec![viewer];

    for depth in 1..=MAX_HANDSHAKE_DEPTH {
        let mut next = Vec::new();

        for &node in &frontier {
            for neighbor in graph.outgoing(node) {
                if neighbor == target {
                    return Some(build_path(&parent, node, target));
                }
                // Nodes discovered at the last depth are never expanded.
                if depth < MAX_HANDSHAKE_DEPTH && visited.insert(neighbor) {
                    parent.insert(neighbor, node);
                    next.push(neighbor);
                }
            }
        }

        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    None
}

/// Walk parent links back from `last` to the root, then append `target`.
fn build_path(parent: &HashMap<&UserId, &UserId>, last: &UserId, target: &UserId) -> Vec<UserId> {
    let mut path = vec![target.clone(), last.clone()];
    let mut cursor = last;
    while let Some(&prev) = parent.get(cursor) {
        path.push(prev.clone());
        cursor = prev;
    }
    path.reverse();
    path
}

/// Handshake level from `viewer` to `target`.
pub fn handshake_level(
    graph: &impl TrustAdjacency,
    viewer: &UserId,
    target: &UserId,
) -> HandshakeLevel {
    shortest_trust_path(graph, viewer, target)
        .map(|path| HandshakeLevel::from_hops(path.len() - 1))
        .unwrap_or(HandshakeLevel::None)
}

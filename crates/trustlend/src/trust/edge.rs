//! Trust edges — a follower's single-hop assertion of trust in another user.

use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};
use crate::identity::UserId;

/// Unique identifier for a trust edge.
///
/// Format: `edge_` + base58 of the first 16 bytes of
/// SHA-256("{follower}->{following}"). Derived from the ordered pair, so a
/// pair can never map to two edges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Deterministic id of the ordered pair. The follower's length prefix
    /// keeps ids containing `->` from colliding.
    pub fn for_pair(follower: &UserId, following: &UserId) -> Self {
        Self(crate::id::derived_id(
            "edge",
            &format!("{}:{}->{}", follower.0.len(), follower.0, following.0),
        ))
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque positive strength attached to an edge.
///
/// Stored and returned as-is; path computation ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TrustStrength(u32);

impl TrustStrength {
    /// The only value the trust workflow currently produces.
    pub const DEFAULT: Self = Self(1);

    pub fn new(value: u32) -> Result<Self> {
        if value == 0 {
            return Err(MarketError::InvalidEdge(
                "trust strength must be a positive integer".into(),
            ));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for TrustStrength {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for TrustStrength {
    type Error = MarketError;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<TrustStrength> for u32 {
    fn from(s: TrustStrength) -> u32 {
        s.0
    }
}

/// A directed trust edge, follower → following.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustEdge {
    pub id: EdgeId,
    pub follower: UserId,
    pub following: UserId,
    pub strength: TrustStrength,
    /// Creation timestamp (microseconds since epoch).
    pub created_at: u64,
}

impl TrustEdge {
    /// Build a new edge, rejecting self-trust.
    pub fn new(follower: UserId, following: UserId, strength: TrustStrength) -> Result<Self> {
        if follower == following {
            return Err(MarketError::InvalidEdge(format!(
                "user {follower} cannot trust themselves"
            )));
        }
        if follower.0.trim().is_empty() || following.0.trim().is_empty() {
            return Err(MarketError::InvalidEdge("user ids must not be empty".into()));
        }
        Ok(Self {
            id: EdgeId::for_pair(&follower, &following),
            follower,
            following,
            strength,
            created_at: crate::time::now_micros(),
        })
    }
}

//! Error types for Trustlend.
//!
//! Domain failures (bad input, self-trust, overlapping bookings, permission
//! and state-machine violations, missing entities) are kept distinct from
//! storage failures so callers can tell "your request is wrong" apart from
//! "the store is broken". Nothing here is retried automatically.

use chrono::NaiveDate;

use crate::booking::{BookingId, BookingStatus};
use crate::catalog::ItemId;

/// Transport-level failure taxonomy.
///
/// Every [`MarketError`] folds onto exactly one kind; the CLI and RPC
/// surfaces report this value rather than the full variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    InvalidEdge,
    IntervalConflict,
    Unauthorized,
    InvalidTransition,
    NotFound,
    Storage,
}

impl ErrorKind {
    /// Stable snake_case tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::InvalidEdge => "invalid_edge",
            Self::IntervalConflict => "interval_conflict",
            Self::Unauthorized => "unauthorized",
            Self::InvalidTransition => "invalid_transition",
            Self::NotFound => "not_found",
            Self::Storage => "storage",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marketplace error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid trust edge: {0}")]
    InvalidEdge(String),

    #[error(
        "Booking for {item} over {}..={} overlaps active booking {existing}",
        requested.0,
        requested.1
    )]
    IntervalConflict {
        item: ItemId,
        requested: (NaiveDate, NaiveDate),
        existing: BookingId,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Booking {booking} cannot move from {from} to {to}")]
    InvalidTransition {
        booking: BookingId,
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MarketError {
    /// Fold this error onto the transport-level taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::InvalidEdge(_) => ErrorKind::InvalidEdge,
            Self::IntervalConflict { .. } => ErrorKind::IntervalConflict,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::StorageError(_)
            | Self::SerializationError(_)
            | Self::InvalidFileFormat(_)
            | Self::Io(_) => ErrorKind::Storage,
        }
    }

    /// `true` for failures raised by the persistence layer itself.
    pub fn is_storage(&self) -> bool {
        self.kind() == ErrorKind::Storage
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, MarketError>;

//! TrustLend — trust-gated peer-to-peer rental core.
//!
//! Users follow each other to form a directed trust graph; every listed
//! item is shown with the viewer's handshake level to its owner (direct,
//! friend-of-friend, third degree or none). Items are booked over
//! inclusive date ranges, and the ledger guarantees that no two active
//! bookings of one item overlap, even under concurrent requests.

pub mod booking;
pub mod catalog;
pub mod config;
pub mod discovery;
pub mod error;
pub mod id;
pub mod identity;
pub mod market;
pub mod storage;
pub mod time;
pub mod trust;

// Re-export primary types
pub use config::MarketConfig;
pub use error::{ErrorKind, MarketError, Result};
pub use market::Marketplace;

pub use identity::{Profile, ProfileDirectory, UserId};
pub use trust::{EdgeId, HandshakeLevel, TrustEdge, TrustGraph, TrustStrength};

pub use catalog::{GeoPoint, Item, ItemCatalog, ItemId, NewItem, PricePerDay};

pub use booking::{
    Booking, BookingId, BookingLedger, BookingScheduler, BookingStatus, BookingSummary, DateRange,
    Decision, IncomingRequest,
};

pub use discovery::{DiscoveryAggregator, HandshakeSource, VisibleItem};

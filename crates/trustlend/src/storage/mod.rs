//! Persistence for profiles, trust edges, items and bookings.
//!
//! Each component keeps its working set in memory and writes every
//! mutation through to a [`RecordDir`] before publishing it. On open the
//! directory is read back in full.
//!
//! # Directory layout
//!
//! ```text
//! {data_dir}/
//! ├── config.json          (optional, see crate::config)
//! ├── profiles/
//! │   └── {profile_key}.json
//! ├── trust/
//! │   └── {edge_id}.json
//! ├── items/
//! │   └── {item_id}.json
//! └── bookings/
//!     ├── {booking_id}.json
//!     └── {item_id}.lock   (held while a booking for the item is written)
//! ```
//!
//! # Modules
//!
//! - [`record_dir`] — versioned one-file-per-record JSON directory.

pub mod record_dir;

pub use record_dir::{is_file_safe, RecordDir, RecordLock};

/// Sub-directory holding profile records.
pub const PROFILES_DIR: &str = "profiles";
/// Sub-directory holding trust edge records.
pub const TRUST_DIR: &str = "trust";
/// Sub-directory holding item records.
pub const ITEMS_DIR: &str = "items";
/// Sub-directory holding booking records.
pub const BOOKINGS_DIR: &str = "bookings";

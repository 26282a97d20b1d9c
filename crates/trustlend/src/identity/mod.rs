//! Users and their public profiles.
//!
//! User identity is owned by an external collaborator that authenticates
//! callers and hands this crate an opaque, already-verified [`UserId`].
//! Profile attributes (display name, contact) are read through the
//! [`ProfileDirectory`] trait and never mutated by the marketplace core.

pub mod profile;
pub mod search;

pub use profile::{Profile, ProfileDirectory, ProfileStore, UserId};
pub use search::{search_profiles, SearchRequest};

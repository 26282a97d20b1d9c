//! Profile search by display name.

use super::profile::{Profile, ProfileDirectory, UserId};
use crate::error::Result;

/// Parameters for [`search_profiles`].
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Free text matched against display names.
    pub query: String,
    /// Profile to leave out of the results, usually the caller.
    pub exclude: Option<UserId>,
    /// Maximum number of results.
    pub limit: usize,
    /// Queries shorter than this (after trimming) match nothing.
    pub min_chars: usize,
}

/// Case-insensitive substring search over display names.
///
/// A query below `min_chars` yields an empty result rather than an error.
/// Matches are ordered by display name, then id, and capped at `limit`.
pub fn search_profiles(
    directory: &dyn ProfileDirectory,
    request: &SearchRequest,
) -> Result<Vec<Profile>> {
    let needle = request.query.trim().to_lowercase();
    if needle.chars().count() < request.min_chars || request.limit == 0 {
        return Ok(Vec::new());
    }

    let mut matches: Vec<Profile> = directory
        .all_profiles()?
        .into_iter()
        .filter(|p| request.exclude.as_ref() != Some(&p.id))
        .filter(|p| p.display_name.to_lowercase().contains(&needle))
        .collect();

    matches.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
    matches.truncate(request.limit);
    Ok(matches)
}

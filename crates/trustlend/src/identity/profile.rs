//! User identifiers, profiles and the profile directory.

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};
use crate::storage::RecordDir;

/// Opaque identifier of a verified user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Public attributes of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub display_name: String,
    pub contact: String,
}

impl Profile {
    pub fn new(
        id: impl Into<UserId>,
        display_name: impl Into<String>,
        contact: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            contact: contact.into(),
        }
    }

    /// Placeholder used when the directory has no entry for a user.
    pub fn unknown(id: &UserId) -> Self {
        Self {
            id: id.clone(),
            display_name: id.0.clone(),
            contact: String::new(),
        }
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Read surface of the external identity collaborator.
pub trait ProfileDirectory: Send + Sync {
    /// Look up one profile.
    fn profile(&self, id: &UserId) -> Result<Option<Profile>>;

    /// Every known profile, in no particular order.
    fn all_profiles(&self) -> Result<Vec<Profile>>;

    /// Like [`profile`](Self::profile) but falls back to [`Profile::unknown`].
    fn profile_or_unknown(&self, id: &UserId) -> Profile {
        match self.profile(id) {
            Ok(Some(p)) => p,
            Ok(None) => Profile::unknown(id),
            Err(e) => {
                log::warn!("profile lookup for {id} failed: {e}");
                Profile::unknown(id)
            }
        }
    }
}

// ── ProfileStore ──────────────────────────────────────────────────────────────

/// Local profile directory, in memory or backed by a [`RecordDir`].
///
/// Files are keyed by a digest of the user id because external ids are not
/// guaranteed to be file-safe.
pub struct ProfileStore {
    profiles: RwLock<HashMap<UserId, Profile>>,
    /// Serializes writers so disk and memory agree on the last write.
    writes: Mutex<()>,
    records: Option<RecordDir<Profile>>,
}

impl ProfileStore {
    /// Empty, non-persistent directory.
    pub fn in_memory() -> Self {
        Self {
            profiles: RwLock::new(HashMap::new()),
            writes: Mutex::new(()),
            records: None,
        }
    }

    /// Open a file-backed directory, loading every stored profile.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let records = RecordDir::open(base_dir)?;
        let profiles = records
            .load_all()?
            .into_iter()
            .map(|p: Profile| (p.id.clone(), p))
            .collect::<HashMap<_, _>>();
        log::debug!("loaded {} profiles", profiles.len());
        Ok(Self {
            profiles: RwLock::new(profiles),
            writes: Mutex::new(()),
            records: Some(records),
        })
    }

    /// Register or replace a profile.
    pub fn upsert(&self, profile: Profile) -> Result<()> {
        if profile.id.0.trim().is_empty() {
            return Err(MarketError::InvalidInput("user id must not be empty".into()));
        }
        if profile.display_name.trim().is_empty() {
            return Err(MarketError::InvalidInput(
                "display name must not be empty".into(),
            ));
        }

        let _writer = self.writes.lock();
        if let Some(records) = &self.records {
            records.save(&profile_key(&profile.id), &profile)?;
        }
        log::info!("registered profile {}", profile.id);
        self.profiles.write().insert(profile.id.clone(), profile);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }
}

impl ProfileDirectory for ProfileStore {
    fn profile(&self, id: &UserId) -> Result<Option<Profile>> {
        Ok(self.profiles.read().get(id).cloned())
    }

    fn all_profiles(&self) -> Result<Vec<Profile>> {
        Ok(self.profiles.read().values().cloned().collect())
    }
}

fn profile_key(id: &UserId) -> String {
    crate::id::derived_id("user", &id.0)
}

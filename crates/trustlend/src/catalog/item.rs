//! Item records and their validated attributes.

use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};
use crate::identity::UserId;

/// Unique identifier for an item.
///
/// Format: `item_` + base58 of the first 16 bytes of a salted SHA-256 over
/// the owner, title and publication time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Validate latitude in [-90, 90] and longitude in [-180, 180].
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(MarketError::InvalidInput(format!(
                "latitude out of range: {lat}"
            )));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(MarketError::InvalidInput(format!(
                "longitude out of range: {lng}"
            )));
        }
        Ok(Self { lat, lng })
    }
}

/// Non-negative daily price.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct PricePerDay(f64);

impl PricePerDay {
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(MarketError::InvalidInput(format!(
                "price per day must be a non-negative number, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for PricePerDay {
    type Error = MarketError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PricePerDay> for f64 {
    fn from(p: PricePerDay) -> f64 {
        p.0
    }
}

/// A published rentable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub owner: UserId,
    pub title: String,
    pub location: GeoPoint,
    pub price_per_day: PricePerDay,
    /// Publication timestamp (microseconds since epoch).
    pub created_at: u64,
}

impl Item {
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner == user
    }
}

/// Unvalidated publication request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub owner: UserId,
    pub title: String,
    pub lat: f64,
    pub lng: f64,
    pub price_per_day: f64,
}

impl NewItem {
    /// Validate and stamp a new item.
    ///
    /// The title is stored trimmed and must not be empty.
    pub fn into_item(self) -> Result<Item> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(MarketError::InvalidInput("title must not be empty".into()));
        }
        if self.owner.0.trim().is_empty() {
            return Err(MarketError::InvalidInput("owner id must not be empty".into()));
        }
        let location = GeoPoint::new(self.lat, self.lng)?;
        let price_per_day = PricePerDay::new(self.price_per_day)?;

        let created_at = crate::time::now_micros();
        let id = ItemId(crate::id::random_id(
            "item",
            &format!("item:{}:{}:{}", self.owner.0, title, created_at),
        ));

        Ok(Item {
            id,
            owner: self.owner,
            title: title.to_string(),
            location,
            price_per_day,
            created_at,
        })
    }
}

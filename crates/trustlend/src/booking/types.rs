//! Data structures for bookings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::ItemId;
use crate::error::{MarketError, Result};
use crate::identity::UserId;

// ---------------------------------------------------------------------------
// Booking
// ---------------------------------------------------------------------------

/// Unique identifier for a booking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookingId(pub String);

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reservation request for an item over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub item_id: ItemId,
    pub borrower: UserId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    pub created_at: u64,
    /// When the owner confirmed or cancelled it.
    pub decided_at: Option<u64>,
}

impl Booking {
    /// A fresh pending booking.
    pub fn pending(item_id: ItemId, borrower: UserId, range: DateRange) -> Self {
        let created_at = crate::time::now_micros();
        let id = BookingId(crate::id::random_id(
            "bkg",
            &format!(
                "booking:{}:{}:{}:{}:{}",
                item_id.0, borrower.0, range.start, range.end, created_at
            ),
        ));
        Self {
            id,
            item_id,
            borrower,
            start_date: range.start,
            end_date: range.end,
            status: BookingStatus::Pending,
            created_at,
            decided_at: None,
        }
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Booking lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    /// Active bookings block their dates.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Cancelled)
    }

    /// Only pending bookings move, and only to a terminal state.
    pub fn can_transition_to(self, next: Self) -> bool {
        self == Self::Pending && next.is_terminal()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(MarketError::InvalidInput(format!(
                "unknown booking status: {other}"
            ))),
        }
    }
}

/// An owner's verdict on a pending booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Confirm,
    Cancel,
}

impl Decision {
    /// Status the booking moves to.
    pub fn target(self) -> BookingStatus {
        match self {
            Self::Confirm => BookingStatus::Confirmed,
            Self::Cancel => BookingStatus::Cancelled,
        }
    }
}

impl std::str::FromStr for Decision {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "confirm" | "confirmed" | "approve" => Ok(Self::Confirm),
            "cancel" | "cancelled" | "reject" => Ok(Self::Cancel),
            other => Err(MarketError::InvalidInput(format!("unknown decision: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Date range
// ---------------------------------------------------------------------------

/// Inclusive range of calendar dates, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// # Errors
    ///
    /// `InvalidInput` when `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(MarketError::InvalidInput(format!(
                "invalid range: start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Both ranges share at least one date.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Number of dates covered, both endpoints included.
    pub fn len_days(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }

    /// Every date in the range, in order.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

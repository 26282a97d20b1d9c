//! Booking scheduler — request validation, owner decisions and views.
//!
//! The scheduler validates requests against the catalog and authorizes
//! owner decisions; the interval exclusion itself is enforced by the
//! [`BookingLedger`] underneath.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{Item, ItemCatalog, ItemId};
use crate::error::{MarketError, Result};
use crate::identity::{Profile, ProfileDirectory, UserId};

use super::ledger::BookingLedger;
use super::quote::quote;
use super::types::{Booking, BookingId, DateRange, Decision};

/// A booking with the summary of the item it reserves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingSummary {
    pub booking: Booking,
    pub item_title: String,
    pub price_per_day: f64,
    /// Price of the whole range at the item's current rate.
    pub total_price: f64,
}

/// A booking on one of the owner's items, with the borrower's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingRequest {
    pub booking: Booking,
    pub item_title: String,
    pub borrower: Profile,
}

/// Default cap on the length of one booking request.
pub const DEFAULT_MAX_BOOKING_DAYS: u64 = 366;

/// Enforces booking lifecycle and authorization rules.
pub struct BookingScheduler {
    catalog: Arc<ItemCatalog>,
    ledger: Arc<BookingLedger>,
    forbid_self_booking: bool,
    max_booking_days: u64,
}

impl BookingScheduler {
    pub fn new(catalog: Arc<ItemCatalog>, ledger: Arc<BookingLedger>) -> Self {
        Self {
            catalog,
            ledger,
            forbid_self_booking: true,
            max_booking_days: DEFAULT_MAX_BOOKING_DAYS,
        }
    }

    /// Allow or forbid owners booking their own items.
    pub fn forbid_self_booking(mut self, forbid: bool) -> Self {
        self.forbid_self_booking = forbid;
        self
    }

    /// Reject requests covering more than `days` dates.
    pub fn max_booking_days(mut self, days: u64) -> Self {
        self.max_booking_days = days;
        self
    }

    pub fn ledger(&self) -> &BookingLedger {
        &self.ledger
    }

    // ── Mutations ─────────────────────────────────────────────────────────────

    /// Request `item` for the inclusive range `start..=end`.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `start > end` or the range is longer than the
    ///   configured maximum
    /// - `NotFound` if the item does not exist
    /// - `Unauthorized` if the borrower owns the item and self-booking is
    ///   forbidden
    /// - `IntervalConflict` if an active booking overlaps the range
    pub fn request_booking(
        &self,
        item_id: &ItemId,
        borrower: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Booking> {
        let range = DateRange::new(start, end)?;
        if range.len_days() > self.max_booking_days {
            return Err(MarketError::InvalidInput(format!(
                "booking covers {} days, at most {} allowed",
                range.len_days(),
                self.max_booking_days
            )));
        }
        let item = self.catalog.require(item_id)?;

        if self.forbid_self_booking && item.is_owned_by(borrower) {
            return Err(MarketError::Unauthorized(format!(
                "{borrower} cannot book their own item {item_id}"
            )));
        }

        self.ledger
            .reserve(Booking::pending(item.id, borrower.clone(), range))
    }

    /// Apply the owner's decision to a pending booking.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the booking (or its item) does not exist
    /// - `Unauthorized` if `acting` does not own the booked item
    /// - `InvalidTransition` if the booking is no longer pending
    pub fn decide(&self, booking_id: &BookingId, acting: &UserId, decision: Decision) -> Result<Booking> {
        let booking = self.ledger.require(booking_id)?;
        let item = self.catalog.require(&booking.item_id)?;

        if !item.is_owned_by(acting) {
            log::warn!("{acting} tried to {decision:?} booking {booking_id} on {}", item.id);
            return Err(MarketError::Unauthorized(format!(
                "only the owner of {} may decide booking {booking_id}",
                item.id
            )));
        }

        self.ledger.transition(booking_id, decision.target())
    }

    // ── Views ─────────────────────────────────────────────────────────────────

    /// Every date covered by a pending or confirmed booking of the item.
    pub fn list_blocked_dates(&self, item_id: &ItemId) -> BTreeSet<NaiveDate> {
        self.ledger
            .active_for_item(item_id)
            .iter()
            .flat_map(|b| b.range().days())
            .collect()
    }

    /// Price of an existing booking at its item's current daily rate.
    pub fn quote_booking(&self, booking_id: &BookingId) -> Result<f64> {
        let booking = self.ledger.require(booking_id)?;
        let item = self.catalog.require(&booking.item_id)?;
        Ok(quote(item.price_per_day, booking.start_date, booking.end_date))
    }

    /// Bookings made by `borrower`, ordered by start date.
    pub fn list_borrower_bookings(&self, borrower: &UserId) -> Vec<BookingSummary> {
        let mut out: Vec<BookingSummary> = self
            .ledger
            .for_borrower(borrower)
            .into_iter()
            .filter_map(|booking| {
                let item = self.item_for(&booking)?;
                Some(BookingSummary {
                    total_price: quote(item.price_per_day, booking.start_date, booking.end_date),
                    price_per_day: item.price_per_day.get(),
                    item_title: item.title,
                    booking,
                })
            })
            .collect();
        out.sort_by(|a, b| order_key(&a.booking).cmp(&order_key(&b.booking)));
        out
    }

    /// Bookings on the owner's items made by other users, ordered by start
    /// date.
    pub fn list_incoming_requests(
        &self,
        owner: &UserId,
        profiles: &dyn ProfileDirectory,
    ) -> Vec<IncomingRequest> {
        let mut out = Vec::new();
        for item in self.catalog.list_by_owner(owner) {
            for booking in self.ledger.for_item(&item.id) {
                if &booking.borrower == owner {
                    continue;
                }
                out.push(IncomingRequest {
                    borrower: profiles.profile_or_unknown(&booking.borrower),
                    item_title: item.title.clone(),
                    booking,
                });
            }
        }
        out.sort_by(|a, b| order_key(&a.booking).cmp(&order_key(&b.booking)));
        out
    }

    fn item_for(&self, booking: &Booking) -> Option<Item> {
        let item = self.catalog.get(&booking.item_id);
        if item.is_none() {
            log::warn!("booking {} refers to unknown item {}", booking.id, booking.item_id);
        }
        item
    }
}

fn order_key(b: &Booking) -> (NaiveDate, &str) {
    (b.start_date, b.id.0.as_str())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Bookings — time-ranged reservations of items.
//!
//! The booking module provides:
//! - Inclusive calendar-date ranges and the overlap test
//! - The pending → {confirmed, cancelled} lifecycle
//! - A ledger that refuses overlapping active bookings per item
//! - A scheduler that adds validation and owner authorization on top
//! - Inclusive-day price quotes

pub mod ledger;
pub mod quote;
pub mod scheduler;
pub mod types;

pub use ledger::BookingLedger;
pub use quote::{quote, rental_days};
pub use scheduler::{
    BookingScheduler, BookingSummary, IncomingRequest, DEFAULT_MAX_BOOKING_DAYS,
};
pub use types::{Booking, BookingId, BookingStatus, DateRange, Decision};

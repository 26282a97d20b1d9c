//! Rental price quotes.
//!
//! A rental is charged per calendar date touched, both boundary dates
//! included: one day for a same-day rental, three for the 1st to the 3rd.
//! The endpoints may be given in either order.

use chrono::NaiveDate;

use crate::catalog::PricePerDay;

/// Number of charged days between two dates, inclusive.
pub fn rental_days(start: NaiveDate, end: NaiveDate) -> u64 {
    (end - start).num_days().unsigned_abs() + 1
}

/// Total price for renting at `price_per_day` from `start` to `end`.
pub fn quote(price_per_day: PricePerDay, start: NaiveDate, end: NaiveDate) -> f64 {
    rental_days(start, end) as f64 * price_per_day.get()
}

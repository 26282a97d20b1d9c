//! Booking ledger — the storage-level home of the interval exclusion rule.
//!
//! Bookings are partitioned by item. Each item's bookings live behind their
//! own mutex, and every write to an item (reserve or transition) holds that
//! mutex across check, persist and publish. Two reservations for the same
//! item are therefore serialized, while reservations for different items
//! never wait on each other beyond a brief map lookup.
//!
//! A file-backed ledger also takes the item's lock file in the bookings
//! directory and re-reads the item's records before checking, so separate
//! processes sharing one data directory are serialized the same way.
//!
//! Invariant: per item, no two active (pending or confirmed) bookings have
//! overlapping inclusive date ranges.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::catalog::ItemId;
use crate::error::{MarketError, Result};
use crate::identity::UserId;
use crate::storage::{is_file_safe, RecordDir, RecordLock};

use super::types::{Booking, BookingId, BookingStatus, DateRange};

// ── Per-item schedule ─────────────────────────────────────────────────────────

#[derive(Default)]
struct ItemSchedule {
    /// Insertion order.
    bookings: Vec<Booking>,
}

impl ItemSchedule {
    /// First active booking overlapping `range`.
    fn conflict(&self, range: &DateRange) -> Option<&Booking> {
        self.bookings
            .iter()
            .filter(|b| b.is_active())
            .find(|b| b.range().overlaps(range))
    }

    fn position(&self, id: &BookingId) -> Option<usize> {
        self.bookings.iter().position(|b| &b.id == id)
    }
}

// ── BookingLedger ─────────────────────────────────────────────────────────────

/// Concurrent, optionally file-backed booking store.
pub struct BookingLedger {
    schedules: RwLock<HashMap<ItemId, Arc<Mutex<ItemSchedule>>>>,
    locator: RwLock<HashMap<BookingId, ItemId>>,
    records: Option<RecordDir<Booking>>,
}

impl BookingLedger {
    /// Empty, non-persistent ledger.
    pub fn in_memory() -> Self {
        Self {
            schedules: RwLock::new(HashMap::new()),
            locator: RwLock::new(HashMap::new()),
            records: None,
        }
    }

    /// Open a file-backed ledger.
    ///
    /// # Errors
    ///
    /// Storage errors from the record directory, or `InvalidFileFormat` if
    /// the stored bookings already violate the exclusion invariant.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let records = RecordDir::open(base_dir)?;
        let mut bookings: Vec<Booking> = records.load_all()?;
        bookings.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let mut schedules: HashMap<ItemId, ItemSchedule> = HashMap::new();
        let mut locator = HashMap::new();
        for booking in bookings {
            if booking.start_date > booking.end_date {
                return Err(MarketError::InvalidFileFormat(format!(
                    "booking {} has an inverted range",
                    booking.id
                )));
            }
            let schedule = schedules.entry(booking.item_id.clone()).or_default();
            if booking.is_active() {
                if let Some(existing) = schedule.conflict(&booking.range()) {
                    return Err(MarketError::InvalidFileFormat(format!(
                        "stored booking {} overlaps active booking {}",
                        booking.id, existing.id
                    )));
                }
            }
            locator.insert(booking.id.clone(), booking.item_id.clone());
            schedule.bookings.push(booking);
        }
        log::debug!("loaded {} bookings", locator.len());

        let schedules = schedules
            .into_iter()
            .map(|(item, s)| (item, Arc::new(Mutex::new(s))))
            .collect();

        Ok(Self {
            schedules: RwLock::new(schedules),
            locator: RwLock::new(locator),
            records: Some(records),
        })
    }

    /// Store a new booking.
    ///
    /// Active bookings are checked against the item's other active bookings
    /// under the item's lock; the check and the insert are indivisible.
    ///
    /// # Errors
    ///
    /// `IntervalConflict` naming the first overlapping booking, or a storage
    /// error if persisting fails.
    pub fn reserve(&self, booking: Booking) -> Result<Booking> {
        let schedule = self.schedule(&booking.item_id);
        let mut schedule = schedule.lock();
        let _file_lock = self.lock_item(&booking.item_id)?;
        self.sync_item(&booking.item_id, &mut schedule)?;

        if booking.is_active() {
            if let Some(existing) = schedule.conflict(&booking.range()) {
                log::warn!(
                    "rejected booking on {} for {}: overlaps {}",
                    booking.item_id,
                    booking.range(),
                    existing.id
                );
                return Err(MarketError::IntervalConflict {
                    item: booking.item_id.clone(),
                    requested: (booking.start_date, booking.end_date),
                    existing: existing.id.clone(),
                });
            }
        }

        if let Some(records) = &self.records {
            records.save(&booking.id.0, &booking)?;
        }
        self.locator
            .write()
            .insert(booking.id.clone(), booking.item_id.clone());
        schedule.bookings.push(booking.clone());

        log::info!(
            "{} requested {} for {} ({})",
            booking.borrower,
            booking.item_id,
            booking.range(),
            booking.id
        );
        Ok(booking)
    }

    /// Move a booking to `next`, atomically with respect to its item.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, `InvalidTransition` unless the booking
    /// is pending and `next` is terminal, or a storage error.
    pub fn transition(&self, id: &BookingId, next: BookingStatus) -> Result<Booking> {
        let item = self.item_of(id)?;
        let schedule = self.schedule(&item);
        let mut schedule = schedule.lock();
        let _file_lock = self.lock_item(&item)?;
        self.sync_item(&item, &mut schedule)?;

        let pos = schedule
            .position(id)
            .ok_or_else(|| MarketError::NotFound(format!("booking not found: {id}")))?;

        let current = schedule.bookings[pos].status;
        if !current.can_transition_to(next) {
            return Err(MarketError::InvalidTransition {
                booking: id.clone(),
                from: current,
                to: next,
            });
        }

        let mut updated = schedule.bookings[pos].clone();
        updated.status = next;
        updated.decided_at = Some(crate::time::now_micros());

        if let Some(records) = &self.records {
            records.save(&updated.id.0, &updated)?;
        }
        schedule.bookings[pos] = updated.clone();

        log::info!("booking {} is now {}", updated.id, updated.status);
        Ok(updated)
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    /// A booking by id. A file-backed ledger also finds bookings written by
    /// other handles since it was opened.
    pub fn get(&self, id: &BookingId) -> Option<Booking> {
        let Some(item) = self.locator.read().get(id).cloned() else {
            return self.load_unseen(id);
        };
        let schedule = self.existing_schedule(&item)?;
        let found = schedule.lock().bookings.iter().find(|b| &b.id == id).cloned();
        found
    }

    /// Like [`get`](Self::get) but a missing booking is `NotFound`.
    pub fn require(&self, id: &BookingId) -> Result<Booking> {
        self.get(id)
            .ok_or_else(|| MarketError::NotFound(format!("booking not found: {id}")))
    }

    /// All bookings for an item, in insertion order.
    pub fn for_item(&self, item: &ItemId) -> Vec<Booking> {
        self.existing_schedule(item)
            .map(|s| s.lock().bookings.clone())
            .unwrap_or_default()
    }

    /// Pending and confirmed bookings for an item, in insertion order.
    pub fn active_for_item(&self, item: &ItemId) -> Vec<Booking> {
        self.existing_schedule(item)
            .map(|s| {
                s.lock()
                    .bookings
                    .iter()
                    .filter(|b| b.is_active())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every booking made by `borrower`, across all items.
    pub fn for_borrower(&self, borrower: &UserId) -> Vec<Booking> {
        self.snapshot()
            .iter()
            .flat_map(|s| {
                s.lock()
                    .bookings
                    .iter()
                    .filter(|b| &b.borrower == borrower)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.locator.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locator.read().is_empty()
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    /// The item's schedule, created on first use.
    fn schedule(&self, item: &ItemId) -> Arc<Mutex<ItemSchedule>> {
        if let Some(existing) = self.existing_schedule(item) {
            return existing;
        }
        self.schedules
            .write()
            .entry(item.clone())
            .or_default()
            .clone()
    }

    fn existing_schedule(&self, item: &ItemId) -> Option<Arc<Mutex<ItemSchedule>>> {
        self.schedules.read().get(item).cloned()
    }

    fn item_of(&self, id: &BookingId) -> Result<ItemId> {
        if let Some(item) = self.locator.read().get(id) {
            return Ok(item.clone());
        }
        self.load_unseen(id)
            .map(|b| b.item_id)
            .ok_or_else(|| MarketError::NotFound(format!("booking not found: {id}")))
    }

    /// Read a booking this handle has not indexed straight from disk.
    fn load_unseen(&self, id: &BookingId) -> Option<Booking> {
        let records = self.records.as_ref()?;
        if !is_file_safe(&id.0) {
            return None;
        }
        match records.try_load(&id.0) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("could not read booking {id}: {e}");
                None
            }
        }
    }

    fn lock_item(&self, item: &ItemId) -> Result<Option<RecordLock>> {
        match &self.records {
            Some(records) => records.lock(&item.0).map(Some),
            None => Ok(None),
        }
    }

    /// Reconcile an item's schedule with the bookings directory.
    ///
    /// Called with the item's file lock held. Picks up bookings other handles
    /// created for the item and status changes to bookings that were still
    /// active here. Terminal bookings never change and are not re-read.
    fn sync_item(&self, item: &ItemId, schedule: &mut ItemSchedule) -> Result<()> {
        let Some(records) = &self.records else {
            return Ok(());
        };

        let mut added = false;
        for key in records.list_keys()? {
            let id = BookingId(key);
            if let Some(pos) = schedule.position(&id) {
                if schedule.bookings[pos].is_active() {
                    if let Some(stored) = records.try_load(&id.0)? {
                        schedule.bookings[pos] = stored;
                    }
                }
                continue;
            }
            if self.locator.read().contains_key(&id) {
                continue;
            }
            let Some(stored) = records.try_load(&id.0)? else {
                continue;
            };
            if &stored.item_id != item {
                continue;
            }
            log::debug!("picked up booking {} for {item} from disk", stored.id);
            self.locator.write().insert(id, item.clone());
            schedule.bookings.push(stored);
            added = true;
        }

        if added {
            schedule
                .bookings
                .sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        }
        Ok(())
    }

    fn snapshot(&self) -> Vec<Arc<Mutex<ItemSchedule>>> {
        self.schedules.read().values().cloned().collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

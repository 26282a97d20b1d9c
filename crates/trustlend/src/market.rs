//! Marketplace — the operation surface consumed by clients.
//!
//! Wires the trust graph, catalog, ledger, scheduler and discovery together
//! over one data directory and exposes each client operation as a method.
//! Callers pass the already-authenticated acting user explicitly.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::booking::{Booking, BookingId, BookingLedger, BookingScheduler, BookingSummary, Decision, IncomingRequest};
use crate::catalog::{Item, ItemCatalog, ItemId, NewItem, PricePerDay};
use crate::config::MarketConfig;
use crate::discovery::{DiscoveryAggregator, VisibleItem};
use crate::error::Result;
use crate::identity::{search_profiles, Profile, ProfileDirectory, ProfileStore, SearchRequest, UserId};
use crate::storage::{BOOKINGS_DIR, ITEMS_DIR, PROFILES_DIR, TRUST_DIR};
use crate::trust::{HandshakeLevel, TrustEdge, TrustGraph, TrustStrength};

/// All marketplace components behind one handle. Cheap to share behind an
/// `Arc`; every method takes `&self`.
pub struct Marketplace {
    config: MarketConfig,
    profiles: Arc<ProfileStore>,
    trust: Arc<TrustGraph>,
    catalog: Arc<ItemCatalog>,
    scheduler: BookingScheduler,
    discovery: DiscoveryAggregator,
}

impl Marketplace {
    /// Open (creating if needed) the marketplace stored under
    /// `config.data_dir`.
    pub fn open(config: MarketConfig) -> Result<Self> {
        let root = config.data_dir.clone();
        let profiles = ProfileStore::open(root.join(PROFILES_DIR))?;
        let trust = TrustGraph::open(root.join(TRUST_DIR))?;
        let catalog = ItemCatalog::open(root.join(ITEMS_DIR))?;
        let ledger = BookingLedger::open(root.join(BOOKINGS_DIR))?;
        log::info!("opened marketplace at {}", root.display());
        Ok(Self::assemble(config, profiles, trust, catalog, ledger))
    }

    /// Non-persistent marketplace.
    pub fn in_memory(config: MarketConfig) -> Self {
        Self::assemble(
            config,
            ProfileStore::in_memory(),
            TrustGraph::in_memory(),
            ItemCatalog::in_memory(),
            BookingLedger::in_memory(),
        )
    }

    fn assemble(
        config: MarketConfig,
        profiles: ProfileStore,
        trust: TrustGraph,
        catalog: ItemCatalog,
        ledger: BookingLedger,
    ) -> Self {
        let profiles = Arc::new(profiles);
        let trust = Arc::new(trust);
        let catalog = Arc::new(catalog);
        let scheduler = BookingScheduler::new(catalog.clone(), Arc::new(ledger))
            .forbid_self_booking(config.forbid_self_booking)
            .max_booking_days(config.max_booking_days);
        let discovery = DiscoveryAggregator::new(catalog.clone(), trust.clone());
        Self {
            config,
            profiles,
            trust,
            catalog,
            scheduler,
            discovery,
        }
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn trust_graph(&self) -> &TrustGraph {
        &self.trust
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn scheduler(&self) -> &BookingScheduler {
        &self.scheduler
    }

    // ── Profiles ──────────────────────────────────────────────────────────────

    /// Register or replace a user's public profile.
    pub fn register_profile(&self, profile: Profile) -> Result<()> {
        self.profiles.upsert(profile)
    }

    pub fn profile(&self, user: &UserId) -> Result<Option<Profile>> {
        self.profiles.profile(user)
    }

    /// SearchProfiles. `limit` falls back to the configured default.
    pub fn search_profiles(
        &self,
        query: &str,
        exclude: Option<&UserId>,
        limit: Option<usize>,
    ) -> Result<Vec<Profile>> {
        search_profiles(
            self.profiles.as_ref(),
            &SearchRequest {
                query: query.to_string(),
                exclude: exclude.cloned(),
                limit: limit.unwrap_or(self.config.search_default_limit),
                min_chars: self.config.search_min_chars,
            },
        )
    }

    // ── Trust ─────────────────────────────────────────────────────────────────

    /// AddTrustEdge.
    pub fn add_trust_edge(
        &self,
        follower: &UserId,
        following: &UserId,
        strength: u32,
    ) -> Result<TrustEdge> {
        self.trust
            .add_edge(follower, following, TrustStrength::new(strength)?)
    }

    /// Remove `follower → following`; `false` if there was no such edge.
    pub fn revoke_trust_edge(&self, follower: &UserId, following: &UserId) -> Result<bool> {
        self.trust.revoke_edge(follower, following)
    }

    /// ListOutgoingTrust: profiles of everyone `user` trusts, oldest first.
    pub fn list_outgoing_trust(&self, user: &UserId) -> Vec<Profile> {
        self.trust
            .outgoing(user)
            .iter()
            .map(|id| self.profiles.profile_or_unknown(id))
            .collect()
    }

    /// Profiles of everyone who trusts `user`, oldest first.
    pub fn list_followers(&self, user: &UserId) -> Vec<Profile> {
        self.trust
            .incoming(user)
            .iter()
            .map(|id| self.profiles.profile_or_unknown(id))
            .collect()
    }

    pub fn handshake_level(&self, viewer: &UserId, target: &UserId) -> HandshakeLevel {
        self.trust.handshake_level(viewer, target)
    }

    pub fn trust_path(&self, viewer: &UserId, target: &UserId) -> Option<Vec<UserId>> {
        self.trust.trust_path(viewer, target)
    }

    // ── Items ─────────────────────────────────────────────────────────────────

    /// PublishItem.
    pub fn publish_item(
        &self,
        owner: &UserId,
        title: &str,
        lat: f64,
        lng: f64,
        price_per_day: f64,
    ) -> Result<Item> {
        self.catalog.publish(NewItem {
            owner: owner.clone(),
            title: title.to_string(),
            lat,
            lng,
            price_per_day,
        })
    }

    /// ListMyItems.
    pub fn list_my_items(&self, owner: &UserId) -> Vec<Item> {
        self.catalog.list_by_owner(owner)
    }

    /// ListVisibleItems.
    pub fn list_visible_items(&self, viewer: &UserId) -> Vec<VisibleItem> {
        self.discovery.list_visible_items(viewer)
    }

    /// ListVisibleItems, closest owners first.
    pub fn rank_visible_items(&self, viewer: &UserId) -> Vec<VisibleItem> {
        self.discovery.rank_visible_items(viewer)
    }

    // ── Bookings ──────────────────────────────────────────────────────────────

    /// RequestBooking.
    pub fn request_booking(
        &self,
        item: &ItemId,
        borrower: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Booking> {
        self.scheduler.request_booking(item, borrower, start, end)
    }

    /// DecideBooking.
    pub fn decide_booking(
        &self,
        booking: &BookingId,
        acting: &UserId,
        decision: Decision,
    ) -> Result<Booking> {
        self.scheduler.decide(booking, acting, decision)
    }

    /// ListBlockedDates.
    pub fn list_blocked_dates(&self, item: &ItemId) -> BTreeSet<NaiveDate> {
        self.scheduler.list_blocked_dates(item)
    }

    /// ListMyBookings.
    pub fn list_my_bookings(&self, borrower: &UserId) -> Vec<BookingSummary> {
        self.scheduler.list_borrower_bookings(borrower)
    }

    /// ListIncomingRequests.
    pub fn list_incoming_requests(&self, owner: &UserId) -> Vec<IncomingRequest> {
        self.scheduler
            .list_incoming_requests(owner, self.profiles.as_ref())
    }

    /// Quote for an arbitrary price and range.
    pub fn quote(&self, price_per_day: f64, start: NaiveDate, end: NaiveDate) -> Result<f64> {
        Ok(crate::booking::quote(PricePerDay::new(price_per_day)?, start, end))
    }

    /// Quote for an existing booking at its item's current price.
    pub fn quote_booking(&self, booking: &BookingId) -> Result<f64> {
        self.scheduler.quote_booking(booking)
    }

    pub fn booking(&self, id: &BookingId) -> Result<Booking> {
        self.scheduler.ledger().require(id)
    }

    pub fn item(&self, id: &ItemId) -> Result<Item> {
        self.catalog.require(id)
    }
}

//! Integration test: full end-to-end workflow.
//!
//! Tests the complete lifecycle:
//! 1. Register profiles and build a trust circle
//! 2. Publish an item and discover it through the circle
//! 3. Request overlapping bookings and observe the conflict
//! 4. Confirm as the owner, then fail to decide again
//! 5. Inspect blocked dates, quotes and per-user views

use std::sync::{Arc, Barrier};
use std::thread;

use chrono::NaiveDate;

use trustlend::{
    BookingStatus, Decision, ErrorKind, HandshakeLevel, MarketConfig, MarketError, Marketplace,
    Profile, UserId,
};

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn market() -> Marketplace {
    Marketplace::in_memory(MarketConfig::default())
}

#[test]
fn full_workflow_trust_to_decision() {
    let m = market();
    let a = UserId::from("user-a");
    let b = UserId::from("user-b");
    let c = UserId::from("user-c");

    // ── Step 1: Profiles and trust ──────────────────────────────────────
    m.register_profile(Profile::new(a.clone(), "Alice", "alice@example.com"))
        .unwrap();
    m.register_profile(Profile::new(b.clone(), "Bob", "bob@example.com"))
        .unwrap();
    m.register_profile(Profile::new(c.clone(), "Carol", "carol@example.com"))
        .unwrap();

    m.add_trust_edge(&a, &b, 1).expect("A should be able to trust B");
    assert_eq!(m.handshake_level(&a, &b), HandshakeLevel::Direct);
    assert_eq!(m.handshake_level(&b, &a), HandshakeLevel::None);

    // ── Step 2: Publish and discover ────────────────────────────────────
    let x = m
        .publish_item(&b, "Cordless drill", 52.52, 13.40, 100.0)
        .expect("B should be able to publish");
    assert!(x.id.0.starts_with("item_"));

    let seen = m.list_visible_items(&a);
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].item.id, x.id);
    assert_eq!(seen[0].handshake_level.as_u8(), 1);
    assert!(!seen[0].is_own_item);
    assert!(m.list_visible_items(&b)[0].is_own_item);

    // ── Step 3: Overlapping requests ────────────────────────────────────
    let booking_a = m
        .request_booking(&x.id, &a, day("2024-03-01"), day("2024-03-03"))
        .expect("A's request should be accepted");
    assert_eq!(booking_a.status, BookingStatus::Pending);

    let err = m
        .request_booking(&x.id, &c, day("2024-03-02"), day("2024-03-04"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IntervalConflict);
    match err {
        MarketError::IntervalConflict { existing, .. } => assert_eq!(existing, booking_a.id),
        other => panic!("expected IntervalConflict, got {other:?}"),
    }

    // ── Step 4: Owner decides exactly once ──────────────────────────────
    let err = m
        .decide_booking(&booking_a.id, &c, Decision::Confirm)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let confirmed = m
        .decide_booking(&booking_a.id, &b, Decision::Confirm)
        .expect("owner confirmation should succeed");
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert!(confirmed.decided_at.is_some());

    let err = m
        .decide_booking(&booking_a.id, &b, Decision::Cancel)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    assert_eq!(m.booking(&booking_a.id).unwrap().status, BookingStatus::Confirmed);

    // ── Step 5: Views ───────────────────────────────────────────────────
    let blocked: Vec<_> = m.list_blocked_dates(&x.id).into_iter().collect();
    assert_eq!(
        blocked,
        vec![day("2024-03-01"), day("2024-03-02"), day("2024-03-03")]
    );

    assert_eq!(m.quote_booking(&booking_a.id).unwrap(), 300.0);

    let mine = m.list_my_bookings(&a);
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].item_title, "Cordless drill");
    assert_eq!(mine[0].total_price, 300.0);

    let incoming = m.list_incoming_requests(&b);
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].borrower.display_name, "Alice");
    assert_eq!(incoming[0].borrower.contact, "alice@example.com");

    // C can book once the range no longer overlaps.
    m.request_booking(&x.id, &c, day("2024-03-04"), day("2024-03-05"))
        .expect("adjacent range should be accepted");
}

#[test]
fn cancelled_booking_frees_its_dates() {
    let m = market();
    let owner = UserId::from("owner");
    let a = UserId::from("a");
    let c = UserId::from("c");
    let item = m.publish_item(&owner, "Tent", 0.0, 0.0, 20.0).unwrap();

    let first = m
        .request_booking(&item.id, &a, day("2024-06-10"), day("2024-06-12"))
        .unwrap();
    m.decide_booking(&first.id, &owner, Decision::Cancel)
        .unwrap();

    assert!(m.list_blocked_dates(&item.id).is_empty());
    m.request_booking(&item.id, &c, day("2024-06-11"), day("2024-06-11"))
        .expect("cancelled booking should not block");
}

#[test]
fn concurrent_overlapping_requests_admit_one() {
    let m = Arc::new(market());
    let owner = UserId::from("owner");
    let item = m.publish_item(&owner, "Kayak", 0.0, 0.0, 35.0).unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [("a", "2024-03-01", "2024-03-03"), ("c", "2024-03-02", "2024-03-04")]
        .into_iter()
        .map(|(who, start, end)| {
            let m = Arc::clone(&m);
            let barrier = Arc::clone(&barrier);
            let item_id = item.id.clone();
            thread::spawn(move || {
                barrier.wait();
                m.request_booking(&item_id, &UserId::from(who), day(start), day(end))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let accepted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 1);
    let rejected = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(rejected.kind(), ErrorKind::IntervalConflict);
}

#[test]
fn self_booking_is_rejected_by_default() {
    let m = market();
    let owner = UserId::from("owner");
    let item = m.publish_item(&owner, "Ladder", 0.0, 0.0, 5.0).unwrap();

    let err = m
        .request_booking(&item.id, &owner, day("2024-01-01"), day("2024-01-01"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn invalid_requests_report_input_errors() {
    let m = market();
    let owner = UserId::from("owner");
    let a = UserId::from("a");
    let item = m.publish_item(&owner, "Saw", 0.0, 0.0, 5.0).unwrap();

    let err = m
        .request_booking(&item.id, &a, day("2024-01-05"), day("2024-01-01"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = m
        .request_booking(
            &trustlend::ItemId("item_missing".into()),
            &a,
            day("2024-01-01"),
            day("2024-01-02"),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = m.publish_item(&owner, "Free lunch", 0.0, 0.0, -1.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn short_search_query_returns_nothing() {
    let m = market();
    let a = UserId::from("user-a");
    m.register_profile(Profile::new("u1", "Abby", "")).unwrap();
    m.register_profile(Profile::new("u2", "Abe", "")).unwrap();

    let results = m.search_profiles("ab", Some(&a), Some(5)).unwrap();
    assert!(results.is_empty());

    let results = m.search_profiles("abb", Some(&a), Some(5)).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].display_name, "Abby");
}

#[test]
fn quote_counts_inclusive_days() {
    let m = market();
    assert_eq!(
        m.quote(100.0, day("2024-01-01"), day("2024-01-03")).unwrap(),
        300.0
    );
    assert_eq!(
        m.quote(100.0, day("2024-01-01"), day("2024-01-01")).unwrap(),
        100.0
    );
}

//! Property tests: interval exclusion and handshake monotonicity.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use trustlend::trust::handshake_level;
use trustlend::{
    Booking, BookingLedger, BookingScheduler, BookingStatus, Decision, ErrorKind, ItemCatalog,
    NewItem, UserId,
};

fn day(offset: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset as i64)
}

#[derive(Debug, Clone)]
enum Op {
    Request { start: u32, len: u32 },
    Decide { pick: usize, confirm: bool },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u32..60, 0u32..10).prop_map(|(start, len)| Op::Request { start, len }),
        1 => (any::<usize>(), any::<bool>()).prop_map(|(pick, confirm)| Op::Decide { pick, confirm }),
    ]
}

fn overlaps_any(active: &[Booking], start: NaiveDate, end: NaiveDate) -> bool {
    active
        .iter()
        .any(|b| b.start_date <= end && start <= b.end_date)
}

proptest! {
    #[test]
    fn accepted_requests_never_overlap(ops in proptest::collection::vec(op(), 1..80)) {
        let catalog = Arc::new(ItemCatalog::in_memory());
        let ledger = Arc::new(BookingLedger::in_memory());
        let scheduler = BookingScheduler::new(catalog.clone(), ledger.clone());
        let owner = UserId::from("owner");
        let borrower = UserId::from("borrower");
        let item = catalog
            .publish(NewItem {
                owner: owner.clone(),
                title: "Generator".into(),
                lat: 0.0,
                lng: 0.0,
                price_per_day: 30.0,
            })
            .unwrap();

        let mut created: Vec<Booking> = Vec::new();
        for op in ops {
            match op {
                Op::Request { start, len } => {
                    let (start, end) = (day(start), day(start + len));
                    let before = ledger.active_for_item(&item.id);
                    let conflict_expected = overlaps_any(&before, start, end);
                    match scheduler.request_booking(&item.id, &borrower, start, end) {
                        Ok(b) => {
                            prop_assert!(!conflict_expected, "accepted {} over {:?}", b.range(), before);
                            created.push(b);
                        }
                        Err(e) => {
                            prop_assert!(conflict_expected);
                            prop_assert_eq!(e.kind(), ErrorKind::IntervalConflict);
                        }
                    }
                }
                Op::Decide { pick, confirm } => {
                    if created.is_empty() {
                        continue;
                    }
                    let id = created[pick % created.len()].id.clone();
                    let current = ledger.require(&id).unwrap().status;
                    let decision = if confirm { Decision::Confirm } else { Decision::Cancel };
                    match scheduler.decide(&id, &owner, decision) {
                        Ok(b) => {
                            prop_assert_eq!(current, BookingStatus::Pending);
                            prop_assert_eq!(b.status, decision.target());
                        }
                        Err(e) => {
                            prop_assert!(current.is_terminal());
                            prop_assert_eq!(e.kind(), ErrorKind::InvalidTransition);
                        }
                    }
                }
            }

            let active = ledger.active_for_item(&item.id);
            for (i, a) in active.iter().enumerate() {
                for b in &active[i + 1..] {
                    prop_assert!(!a.range().overlaps(&b.range()));
                }
            }
        }
    }

    #[test]
    fn adding_an_edge_never_increases_distance(
        edges in proptest::collection::vec((0usize..8, 0usize..8), 0..30),
        extra in (0usize..8, 0usize..8),
    ) {
        let name = |i: usize| UserId::new(format!("p{i}"));
        let mut adjacency: HashMap<UserId, Vec<UserId>> = HashMap::new();
        for (a, b) in edges {
            if a != b {
                let list = adjacency.entry(name(a)).or_default();
                if !list.contains(&name(b)) {
                    list.push(name(b));
                }
            }
        }

        let before: Vec<u8> = (0..8)
            .flat_map(|a| (0..8).map(move |b| (a, b)))
            .map(|(a, b)| handshake_level(&adjacency, &name(a), &name(b)).closeness_rank())
            .collect();

        let (a, b) = extra;
        if a != b {
            let list = adjacency.entry(name(a)).or_default();
            if !list.contains(&name(b)) {
                list.push(name(b));
            }
        }

        let after: Vec<u8> = (0..8)
            .flat_map(|a| (0..8).map(move |b| (a, b)))
            .map(|(a, b)| handshake_level(&adjacency, &name(a), &name(b)).closeness_rank())
            .collect();

        for (x, y) in before.iter().zip(&after) {
            prop_assert!(y <= x, "closeness got worse: {} -> {}", x, y);
        }
    }
}

//! Concurrency test: parallel edge submission and handshake queries.
//!
//! Validates that trust operations are thread-safe and produce consistent results.

use std::sync::{Arc, Barrier};
use std::thread;

use trustlend::{HandshakeLevel, TrustGraph, TrustStrength, UserId};

fn u(id: impl Into<String>) -> UserId {
    UserId::new(id)
}

#[test]
fn stress_double_submission_stores_one_edge() {
    let dir = tempfile::tempdir().unwrap();
    let graph = Arc::new(TrustGraph::open(dir.path()).unwrap());
    let barrier = Arc::new(Barrier::new(32));

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let graph = Arc::clone(&graph);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                graph
                    .add_edge(&u("alice"), &u("bob"), TrustStrength::DEFAULT)
                    .expect("add_edge should succeed")
            })
        })
        .collect();

    let edges: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(edges.windows(2).all(|w| w[0] == w[1]), "all callers see the same edge");
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.outgoing(&u("alice")), vec![u("bob")]);
    assert_eq!(edge_files(dir.path()), 1);
}

#[test]
fn stress_double_submission_across_handles() {
    let dir = tempfile::tempdir().unwrap();
    let handles_on_disk: Vec<Arc<TrustGraph>> = (0..4)
        .map(|_| Arc::new(TrustGraph::open(dir.path()).unwrap()))
        .collect();
    let barrier = Arc::new(Barrier::new(32));

    let threads: Vec<_> = (0..32)
        .map(|t| {
            let graph = Arc::clone(&handles_on_disk[t % handles_on_disk.len()]);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let strength = TrustStrength::new(1 + t as u32).unwrap();
                graph
                    .add_edge(&u("alice"), &u("bob"), strength)
                    .expect("add_edge should succeed")
            })
        })
        .collect();

    let edges: Vec<_> = threads.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(edges.windows(2).all(|w| w[0] == w[1]), "every handle returns the stored edge");
    assert_eq!(edge_files(dir.path()), 1);

    let reopened = TrustGraph::open(dir.path()).unwrap();
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.edge(&u("alice"), &u("bob")).unwrap(), edges[0]);
}

fn edge_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .unwrap()
                .path()
                .extension()
                .is_some_and(|ext| ext == "json")
        })
        .count()
}

#[test]
fn stress_readers_during_writes() {
    let graph = Arc::new(TrustGraph::in_memory());
    // Chain hub -> n0 -> n1 -> ... built while readers query.
    let writer = {
        let graph = Arc::clone(&graph);
        thread::spawn(move || {
            graph
                .add_edge(&u("hub"), &u("n0"), TrustStrength::DEFAULT)
                .unwrap();
            for i in 0..200 {
                graph
                    .add_edge(&u(format!("n{i}")), &u(format!("n{}", i + 1)), TrustStrength::DEFAULT)
                    .unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let graph = Arc::clone(&graph);
            thread::spawn(move || {
                for i in 0..200 {
                    let level = graph.handshake_level(&u("hub"), &u(format!("n{i}")));
                    // Never further than the chain allows.
                    if let Some(d) = level.distance() {
                        assert!(d as usize <= i + 1);
                    }
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }

    assert_eq!(graph.len(), 201);
    assert_eq!(graph.handshake_level(&u("hub"), &u("n0")), HandshakeLevel::Direct);
    assert_eq!(graph.handshake_level(&u("hub"), &u("n2")), HandshakeLevel::ThirdDegree);
    assert_eq!(graph.handshake_level(&u("hub"), &u("n3")), HandshakeLevel::None);
}

#[test]
fn stress_add_and_revoke_interleaved() {
    let graph = Arc::new(TrustGraph::in_memory());
    let handles: Vec<_> = (0..16)
        .map(|t| {
            let graph = Arc::clone(&graph);
            thread::spawn(move || {
                let me = u(format!("user-{t}"));
                for i in 0..50 {
                    let other = u(format!("friend-{i}"));
                    graph.add_edge(&me, &other, TrustStrength::DEFAULT).unwrap();
                    if i % 2 == 0 {
                        assert!(graph.revoke_edge(&me, &other).unwrap());
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(graph.len(), 16 * 25);
    for t in 0..16 {
        assert_eq!(graph.outgoing(&u(format!("user-{t}"))).len(), 25);
    }
    assert_eq!(graph.incoming(&u("friend-1")).len(), 16);
    assert!(graph.incoming(&u("friend-0")).is_empty());
}

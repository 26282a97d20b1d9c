//! Stress test: handshake levels on long chains and dense graphs.

use std::collections::HashMap;

use trustlend::trust::{handshake_level, shortest_trust_path, MAX_HANDSHAKE_DEPTH};
use trustlend::{HandshakeLevel, TrustGraph, TrustStrength, UserId};

fn u(id: impl Into<String>) -> UserId {
    UserId::new(id)
}

#[test]
fn stress_chain_of_50_stops_at_three_hops() {
    let graph = TrustGraph::in_memory();
    for i in 0..50 {
        graph
            .add_edge(&u(format!("c{i}")), &u(format!("c{}", i + 1)), TrustStrength::DEFAULT)
            .unwrap();
    }

    for i in 1..=50 {
        let level = graph.handshake_level(&u("c0"), &u(format!("c{i}")));
        if i <= MAX_HANDSHAKE_DEPTH {
            assert_eq!(level.as_u8() as usize, i);
        } else {
            assert_eq!(level, HandshakeLevel::None, "c{i} is beyond three hops");
        }
    }
}

#[test]
fn stress_dense_graph_levels_match_brute_force() {
    // 60 nodes, node i trusts i+1, i+7 and i*3 (mod 60).
    let n = 60usize;
    let mut adjacency: HashMap<UserId, Vec<UserId>> = HashMap::new();
    let graph = TrustGraph::in_memory();
    for i in 0..n {
        let mut targets = vec![(i + 1) % n, (i + 7) % n, (i * 3) % n];
        targets.dedup();
        for t in targets {
            if t == i {
                continue;
            }
            graph
                .add_edge(&u(format!("n{i}")), &u(format!("n{t}")), TrustStrength::DEFAULT)
                .unwrap();
            let list = adjacency.entry(u(format!("n{i}"))).or_default();
            if !list.contains(&u(format!("n{t}"))) {
                list.push(u(format!("n{t}")));
            }
        }
    }

    for a in 0..n {
        let distances = brute_force_distances(&adjacency, &u(format!("n{a}")));
        for b in 0..n {
            let target = u(format!("n{b}"));
            let expected = distances
                .get(&target)
                .copied()
                .filter(|d| *d >= 1 && *d <= 3)
                .map(|d| d as u8)
                .unwrap_or(0);
            let viewer = u(format!("n{a}"));
            assert_eq!(
                graph.handshake_level(&viewer, &target).as_u8(),
                expected,
                "n{a} -> n{b}"
            );
            assert_eq!(handshake_level(&adjacency, &viewer, &target).as_u8(), expected);
        }
    }
}

/// Minimum path length of at least one hop from `from` to every node
/// reachable within four hops, by exhaustive relaxation.
fn brute_force_distances(
    adjacency: &HashMap<UserId, Vec<UserId>>,
    from: &UserId,
) -> HashMap<UserId, usize> {
    let mut best: HashMap<UserId, usize> = HashMap::new();
    let mut frontier = vec![from.clone()];
    for depth in 1..=4 {
        let mut next = Vec::new();
        for node in &frontier {
            for t in adjacency.get(node).map(Vec::as_slice).unwrap_or(&[]) {
                best.entry(t.clone()).or_insert(depth);
                next.push(t.clone());
            }
        }
        next.sort();
        next.dedup();
        frontier = next;
    }
    best
}

#[test]
fn self_level_needs_a_cycle() {
    let graph = TrustGraph::in_memory();
    let (a, b, c) = (u("a"), u("b"), u("c"));
    graph.add_edge(&a, &b, TrustStrength::DEFAULT).unwrap();
    graph.add_edge(&b, &c, TrustStrength::DEFAULT).unwrap();
    assert_eq!(graph.handshake_level(&a, &a), HandshakeLevel::None);

    graph.add_edge(&c, &a, TrustStrength::DEFAULT).unwrap();
    assert_eq!(graph.handshake_level(&a, &a), HandshakeLevel::ThirdDegree);
    assert_eq!(graph.trust_path(&a, &a), Some(vec![a.clone(), b, c, a]));
}

#[test]
fn path_explains_level() {
    let mut adjacency: HashMap<UserId, Vec<UserId>> = HashMap::new();
    adjacency.insert(u("v"), vec![u("x"), u("y")]);
    adjacency.insert(u("x"), vec![u("z")]);
    adjacency.insert(u("y"), vec![u("t")]);
    adjacency.insert(u("z"), vec![u("t")]);

    let path = shortest_trust_path(&adjacency, &u("v"), &u("t")).unwrap();
    assert_eq!(path, vec![u("v"), u("y"), u("t")]);
    assert_eq!(handshake_level(&adjacency, &u("v"), &u("t")), HandshakeLevel::SecondDegree);
}

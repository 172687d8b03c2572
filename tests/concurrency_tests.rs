use arbor::model::{Arbor, EdgeMap, Location, NodeId, SpacedTree, Tags, TreeGraph};
use std::collections::BTreeMap;
use std::thread;

const THREADS: usize = 8;

fn assert_send_sync<T: Send + Sync>() {}

/// Backbone of `n` nodes with a two-node side branch on every third node.
fn comb(n: NodeId) -> (Vec<(NodeId, NodeId)>, BTreeMap<NodeId, Location>) {
    let mut edges = Vec::new();
    let mut locations = BTreeMap::from([(0, Location::default())]);
    for i in 1..n {
        edges.push((i - 1, i));
        locations.insert(i, Location::new(i as f64, (i % 7) as f64, 0.0));
    }
    for i in (0..n).step_by(3) {
        let (a, b) = (n + 2 * i, n + 2 * i + 1);
        edges.extend([(i, a), (a, b)]);
        locations.insert(a, Location::new(i as f64, -1.0, 2.0));
        locations.insert(b, Location::new(i as f64, -3.0, 2.5));
    }
    (edges, locations)
}

fn spaced_tree() -> SpacedTree {
    let (edges, locations) = comb(300);
    SpacedTree::from_edges(edges, locations, BTreeMap::new()).unwrap()
}

// ============= Thread Safety Tests =============

#[test]
fn test_tree_types_are_send_and_sync() {
    assert_send_sync::<TreeGraph>();
    assert_send_sync::<SpacedTree>();
    assert_send_sync::<Arbor>();
    assert_send_sync::<EdgeMap<f64>>();
}

#[test]
fn test_concurrent_strahler_numbers() {
    let (edges, _) = comb(300);
    let expected = TreeGraph::new(edges.clone())
        .unwrap()
        .strahler_numbers()
        .unwrap()
        .clone();
    let tree = TreeGraph::new(edges).unwrap();

    let addresses: Vec<usize> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    let numbers = tree.strahler_numbers().unwrap();
                    assert_eq!(numbers, &expected);
                    numbers as *const _ as usize
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // Every thread saw the same cached map
    assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn test_concurrent_distance_from_root() {
    let expected = spaced_tree().distance_from_root().unwrap().clone();
    let tree = spaced_tree();

    let addresses: Vec<usize> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    let distances = tree.distance_from_root().unwrap();
                    assert_eq!(distances, &expected);
                    assert_eq!(tree.edge_length().len(), tree.num_edges());
                    distances as *const _ as usize
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn test_concurrent_reads_of_arbor() {
    let tree = spaced_tree();
    let confidence: EdgeMap<u8> = tree.edges().map(|(u, v)| ((u, v), 5)).collect();
    let skeleton = Arbor::new(1, tree, confidence, BTreeMap::new(), Tags::new()).unwrap();
    let expected_strahler = skeleton.strahler_numbers().unwrap().clone();
    let fresh = Arbor::new(
        1,
        spaced_tree(),
        skeleton.edge_confidence().clone(),
        BTreeMap::new(),
        Tags::new(),
    )
    .unwrap();

    thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                assert_eq!(fresh.strahler_numbers().unwrap(), &expected_strahler);
                assert_eq!(fresh.root().unwrap(), 0);
                assert!(fresh.distance_from_root().unwrap()[&299] > 0.0);
            });
        }
    });
}

use arbor::model::{EdgeMap, edge_key, path_edge_data};
use std::collections::BTreeSet;

// ============= Key Tests =============

#[test]
fn test_edge_key_is_canonical() {
    assert_eq!(edge_key(5, 2), (2, 5));
    assert_eq!(edge_key(2, 5), (2, 5));
    assert_eq!(edge_key(-3, 1), (-3, 1));
}

// ============= EdgeMap Tests =============

#[test]
fn test_insert_and_get_in_either_direction() {
    let mut lengths = EdgeMap::new();
    assert_eq!(lengths.insert(1, 2, 0.5), None);
    assert_eq!(lengths.get(2, 1), Some(&0.5));
    assert_eq!(lengths.get(1, 2), Some(&0.5));
    assert!(lengths.get(1, 3).is_none());
}

#[test]
fn test_insert_reversed_overwrites() {
    let mut confidence = EdgeMap::new();
    confidence.insert(3, 7, 1);
    assert_eq!(confidence.insert(7, 3, 4), Some(1));
    assert_eq!(confidence.len(), 1);
    assert_eq!(confidence.get(3, 7), Some(&4));
}

#[test]
fn test_get_mut_and_remove() {
    let mut counts: EdgeMap<u32> = EdgeMap::with_capacity(4);
    counts.insert(10, 20, 1);
    if let Some(count) = counts.get_mut(20, 10) {
        *count += 1;
    }
    assert_eq!(counts.get(10, 20), Some(&2));
    assert_eq!(counts.remove(20, 10), Some(2));
    assert!(counts.is_empty());
    assert!(!counts.contains(10, 20));
}

#[test]
fn test_from_iterator_canonicalizes() {
    let map: EdgeMap<&str> = [((4, 1), "a"), ((2, 3), "b")].into_iter().collect();
    assert_eq!(map.key_set(), BTreeSet::from([(1, 4), (2, 3)]));
    assert!(map.keys().all(|(u, v)| u < v));
}

#[test]
fn test_filtered() {
    let map: EdgeMap<u8> = [((1, 2), 1), ((2, 3), 2), ((3, 4), 3)].into_iter().collect();
    let kept = map.filtered(|u, v| u >= 2 && v >= 2);
    assert_eq!(kept.key_set(), BTreeSet::from([(2, 3), (3, 4)]));
    assert_eq!(map.len(), 3);
}

#[test]
fn test_path_edge_data() {
    let map: EdgeMap<u8> = [((1, 2), 5), ((2, 3), 2), ((3, 4), 9)].into_iter().collect();
    let along: Vec<u8> = path_edge_data(&[4, 3, 2, 1], &map).copied().collect();
    assert_eq!(along, vec![9, 2, 5]);

    // Missing pairs are skipped
    let along: Vec<u8> = path_edge_data(&[1, 2, 7], &map).copied().collect();
    assert_eq!(along, vec![5]);
}

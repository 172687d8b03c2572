use arbor::error::ArborErrorKind;
use arbor::model::{NodeId, TreeGraph, TreeStructure};
use rstest::{fixture, rstest};
use std::collections::{BTreeMap, BTreeSet};

//     1
//     |
//     2
//    / \
//   3   5
//  / \
// 4   6
#[fixture]
fn tree() -> TreeGraph {
    TreeGraph::new([(1, 2), (2, 3), (3, 4), (2, 5), (3, 6)]).unwrap()
}

fn set(nodes: &[NodeId]) -> BTreeSet<NodeId> {
    nodes.iter().copied().collect()
}

// ============= Construction Tests =============

#[rstest]
fn test_basic_properties(tree: TreeGraph) {
    assert_eq!(tree.len(), 6);
    assert_eq!(tree.num_edges(), 5);
    assert_eq!(tree.root().unwrap(), 1);
    assert_eq!(tree.leaves(), &set(&[4, 5, 6]));
    assert_eq!(tree.branches(), &BTreeMap::from([(2, 2), (3, 2)]));
    assert_eq!(tree.parent(3), Some(2));
    assert_eq!(tree.parent(1), None);
    assert_eq!(tree.children(3), &[4, 6]);
    assert!(tree.children(4).is_empty());
    assert!(tree.validate().is_ok());
}

#[test]
fn test_duplicate_edges_are_ignored() {
    let tree = TreeGraph::new([(1, 2), (1, 2), (2, 3)]).unwrap();
    assert_eq!(tree.len(), 3);
    assert_eq!(tree.children(1), &[2]);
}

#[test]
fn test_multiple_parents_rejected() {
    let err = TreeGraph::new([(1, 2), (3, 2)]).unwrap_err();
    assert_eq!(err.kind(), ArborErrorKind::Structural);
}

#[test]
fn test_multiple_roots_rejected() {
    let err = TreeGraph::new([(1, 2), (3, 4)]).unwrap_err();
    assert_eq!(err.kind(), ArborErrorKind::Structural);
}

#[test]
fn test_cycle_rejected() {
    // 3 and 4 point at each other; 1 is the only parentless node
    let err = TreeGraph::new([(1, 2), (3, 4), (4, 3)]).unwrap_err();
    assert_eq!(err.kind(), ArborErrorKind::Structural);
}

#[test]
fn test_single_node_tree() {
    let tree = TreeGraph::with_nodes([7], []).unwrap();
    assert_eq!(tree.root().unwrap(), 7);
    assert_eq!(tree.leaves(), &set(&[7]));
    assert!(tree.branches().is_empty());
    let slabs: Vec<Vec<NodeId>> = tree.slabs().unwrap().collect();
    assert_eq!(slabs, vec![vec![7]]);
}

#[test]
fn test_empty_tree() {
    let tree = TreeGraph::empty();
    assert!(tree.is_empty());
    assert!(tree.validate().is_ok());
    assert_eq!(tree.root().unwrap_err().kind(), ArborErrorKind::Structural);
    assert_eq!(tree.slabs().unwrap().count(), 0);
    assert_eq!(tree.topological_edges().unwrap().count(), 0);
    assert!(tree.cut(&[1]).unwrap().is_empty());
    assert!(tree.strahler_numbers().unwrap().is_empty());
}

// ============= Traversal Tests =============

#[rstest]
fn test_ancestors_path(tree: TreeGraph) {
    let path: Vec<NodeId> = tree.ancestors_path(4).unwrap().collect();
    assert_eq!(path, vec![4, 3, 2, 1]);

    let path: Vec<NodeId> = tree.ancestors_path(1).unwrap().collect();
    assert_eq!(path, vec![1]);
}

#[rstest]
fn test_ancestors_path_of_absent_node(tree: TreeGraph) {
    let err = tree.ancestors_path(99).err().unwrap();
    assert_eq!(err.kind(), ArborErrorKind::NotFound);
}

#[rstest]
fn test_depth_first_edges(tree: TreeGraph) {
    let edges: Vec<_> = tree.depth_first_edges(None, &[]).unwrap().collect();
    assert_eq!(edges, vec![(1, 2), (2, 3), (3, 4), (3, 6), (2, 5)]);
}

#[rstest]
fn test_depth_first_edges_stop_at(tree: TreeGraph) {
    let edges: Vec<_> = tree.depth_first_edges(None, &[3]).unwrap().collect();
    assert_eq!(edges, vec![(1, 2), (2, 5)]);
}

#[rstest]
fn test_depth_first_edges_from_start(tree: TreeGraph) {
    let edges: Vec<_> = tree.depth_first_edges(Some(3), &[]).unwrap().collect();
    assert_eq!(edges, vec![(3, 4), (3, 6)]);

    let err = tree.depth_first_edges(Some(42), &[]).err().unwrap();
    assert_eq!(err.kind(), ArborErrorKind::NotFound);
}

#[rstest]
fn test_topological_edges(tree: TreeGraph) {
    let edges: Vec<_> = tree.topological_edges().unwrap().collect();
    assert_eq!(edges.len(), 5);

    // Every parent appears before any edge leading away from it
    let mut seen = BTreeSet::from([1]);
    for (parent, child) in edges {
        assert!(seen.contains(&parent), "{parent} visited before being reached");
        seen.insert(child);
    }
}

#[rstest]
fn test_pre_and_post_order(tree: TreeGraph) {
    let pre: Vec<NodeId> = tree.pre_order_iter().unwrap().collect();
    assert_eq!(pre, vec![1, 2, 3, 4, 6, 5]);

    let post: Vec<NodeId> = tree.post_order_iter().unwrap().collect();
    assert_eq!(post, vec![4, 6, 3, 5, 2, 1]);
}

#[rstest]
fn test_steps_from_root(tree: TreeGraph) {
    let steps = tree.steps_from_root().unwrap();
    assert_eq!(steps[&1], 0);
    assert_eq!(steps[&5], 2);
    assert_eq!(steps[&6], 3);
}

// ============= Strahler Tests =============

#[rstest]
fn test_strahler_numbers(tree: TreeGraph) {
    let strahler = tree.strahler_numbers().unwrap();
    let expected = BTreeMap::from([(1, 2), (2, 2), (3, 2), (4, 1), (5, 1), (6, 1)]);
    assert_eq!(strahler, &expected);
}

#[test]
fn test_strahler_numbers_balanced() {
    //       1
    //     /   \
    //    2     3
    //   / \   / \
    //  4   5 6   7
    let tree = TreeGraph::new([(1, 2), (1, 3), (2, 4), (2, 5), (3, 6), (3, 7)]).unwrap();
    let strahler = tree.strahler_numbers().unwrap();
    assert_eq!(strahler[&1], 3);
    assert_eq!(strahler[&2], 2);
    assert_eq!(strahler[&7], 1);
}

#[test]
fn test_strahler_numbers_chain() {
    let tree = TreeGraph::new([(1, 2), (2, 3)]).unwrap();
    assert!(tree.strahler_numbers().unwrap().values().all(|&order| order == 1));
}

// ============= Reroot Tests =============

#[rstest]
fn test_reroot(tree: TreeGraph) {
    let rerooted = tree.reroot(4).unwrap();
    assert_eq!(rerooted.root().unwrap(), 4);
    assert_eq!(rerooted.leaves(), &set(&[1, 5, 6]));
    assert_eq!(rerooted.parent(3), Some(4));
    assert_eq!(rerooted.parent(1), Some(2));
    // Edges off the path keep their direction
    assert_eq!(rerooted.parent(6), Some(3));
    assert_eq!(rerooted.parent(5), Some(2));
    assert!(rerooted.validate().is_ok());
}

#[rstest]
fn test_reroot_round_trip(tree: TreeGraph) {
    let back = tree.reroot(6).unwrap().reroot(1).unwrap();
    assert_eq!(back, tree);
}

#[rstest]
fn test_reroot_at_root_is_identity(tree: TreeGraph) {
    assert_eq!(tree.reroot(1).unwrap(), tree);
}

#[rstest]
fn test_reroot_absent_node(tree: TreeGraph) {
    assert_eq!(tree.reroot(99).unwrap_err().kind(), ArborErrorKind::NotFound);
}

// ============= Subtree and Pruning Tests =============

#[rstest]
fn test_copy_below(tree: TreeGraph) {
    let below = tree.copy_below(3).unwrap();
    assert_eq!(below.node_set(), set(&[3, 4, 6]));
    assert_eq!(below.root().unwrap(), 3);
    assert_eq!(tree.subtree_below(3).unwrap(), below);
    assert_eq!(tree.copy_below(8).unwrap_err().kind(), ArborErrorKind::NotFound);
}

#[rstest]
fn test_prune_at(tree: TreeGraph) {
    let pruned = tree.prune_at(&[3]).unwrap();
    assert_eq!(pruned.node_set(), set(&[1, 2, 5]));
    assert!(pruned.validate().is_ok());
}

#[rstest]
fn test_prune_at_root_gives_empty_tree(tree: TreeGraph) {
    assert!(tree.prune_at(&[1]).unwrap().is_empty());
}

#[rstest]
#[case(&[4], &[1, 2, 3, 5, 6])]
#[case(&[3], &[1, 2, 5])]
#[case(&[5], &[1, 2, 3, 4, 6])]
#[case(&[1], &[1, 2, 3, 4, 5, 6])]
#[case(&[4, 5], &[1, 2, 3, 6])]
fn test_prune_branches_containing(
    tree: TreeGraph,
    #[case] nodes: &[NodeId],
    #[case] expected: &[NodeId],
) {
    let pruned = tree.prune_branches_containing(nodes).unwrap();
    assert_eq!(pruned.node_set(), set(expected));
}

#[test]
fn test_prune_branches_containing_deep_node() {
    // 8 sits three steps below the branch at 2
    let tree = TreeGraph::new([(1, 2), (2, 3), (2, 5), (5, 7), (7, 8)]).unwrap();
    let pruned = tree.prune_branches_containing(&[8]).unwrap();
    assert_eq!(pruned.node_set(), set(&[1, 2, 3]));
}

// ============= Cut Tests =============

#[rstest]
fn test_cut(tree: TreeGraph) {
    let pieces = tree.cut(&[2, 3]).unwrap();
    let node_sets: Vec<BTreeSet<NodeId>> = pieces.iter().map(TreeGraph::node_set).collect();
    assert_eq!(node_sets, vec![set(&[2, 5]), set(&[3, 4, 6]), set(&[1])]);
    assert_eq!(pieces[1].root().unwrap(), 3);
}

#[rstest]
fn test_cut_skips_absent_nodes(tree: TreeGraph) {
    let pieces = tree.cut(&[42, 3]).unwrap();
    let node_sets: Vec<BTreeSet<NodeId>> = pieces.iter().map(TreeGraph::node_set).collect();
    assert_eq!(node_sets, vec![set(&[3, 4, 6]), set(&[1, 2, 5])]);
}

#[rstest]
fn test_cut_pieces_partition_nodes(tree: TreeGraph) {
    let pieces = tree.cut(&[6, 2]).unwrap();
    let total: usize = pieces.iter().map(TreeGraph::len).sum();
    assert_eq!(total, tree.len());
    assert!(pieces.iter().all(|piece| piece.validate().is_ok()));
}

// ============= Slab and Topological Copy Tests =============

#[rstest]
fn test_slabs(tree: TreeGraph) {
    let slabs: Vec<Vec<NodeId>> = tree.slabs().unwrap().collect();
    assert_eq!(
        slabs,
        vec![vec![1, 2], vec![2, 3], vec![3, 4], vec![3, 6], vec![2, 5]]
    );
}

#[test]
fn test_topological_copy() {
    // 1 - 2 - 3 - 4
    //          \
    //           5 - 6
    let tree = TreeGraph::new([(1, 2), (2, 3), (3, 4), (3, 5), (5, 6)]).unwrap();
    let copy = tree.topological_copy().unwrap();
    assert_eq!(copy.node_set(), set(&[1, 3, 4, 6]));
    let edges: Vec<_> = copy.edges().collect();
    assert_eq!(edges, vec![(1, 3), (3, 4), (3, 6)]);
    assert!(copy.validate().is_ok());
}

#[rstest]
fn test_topological_copy_keeps_minimal_tree(tree: TreeGraph) {
    assert_eq!(tree.topological_copy().unwrap(), tree);
}

use arbor::error::ArborErrorKind;
use arbor::io::{GRAPH_COLUMNS, SkeletonTable, arbor_from_json, arbor_to_json};
use arbor::model::arbor::SOMA;
use arbor::model::{
    Arbor, ConnectorRelation, EdgeMap, Location, NodeId, SpacedTree, TreenodeConnector,
};
use rstest::{fixture, rstest};
use std::collections::BTreeMap;

//     1
//     |
//     2
//    / \
//   3   5
//  / \
// 4   6
#[fixture]
fn skeleton() -> Arbor {
    let node_loc: BTreeMap<NodeId, Location> = [
        (1, [0.0, 0.0, 0.0]),
        (2, [1.5, 0.25, -3.0]),
        (3, [2.0, 1.0, -3.5]),
        (4, [2.125, 2.0, -4.0]),
        (5, [0.1, 0.7, 12.3]),
        (6, [1e-3, 4.2, 1e5]),
    ]
    .into_iter()
    .map(|(node, xyz)| (node, Location::from(xyz)))
    .collect();
    let node_radius = BTreeMap::from([(1, 5.5), (3, 0.0), (4, 1.25)]);
    let tree = SpacedTree::from_edges(
        [(1, 2), (2, 3), (3, 4), (2, 5), (3, 6)],
        node_loc,
        node_radius,
    )
    .unwrap();

    let confidence: EdgeMap<u8> = [((1, 2), 5), ((2, 3), 4), ((3, 4), 1), ((2, 5), 2), ((3, 6), 3)]
        .into_iter()
        .collect();
    let connectors = BTreeMap::from([
        (
            4,
            vec![
                TreenodeConnector::new(4, 201, ConnectorRelation::PostsynapticTo, Location::new(2.0, 2.0, -4.0)),
                TreenodeConnector::new(4, 200, ConnectorRelation::PresynapticTo, Location::new(2.5, 2.0, -4.0)),
            ],
        ),
        (
            1,
            vec![TreenodeConnector::new(1, 300, ConnectorRelation::GapJunction, Location::new(0.0, 1.0, 0.0))],
        ),
    ]);
    let tags = BTreeMap::from([
        (SOMA.to_string(), vec![1]),
        ("uncertain end".to_string(), vec![6, 4]),
        ("empty".to_string(), vec![]),
    ]);

    Arbor::new(17, tree, confidence, connectors, tags).unwrap()
}

// ============= Table Tests =============

#[rstest]
fn test_table_layout(skeleton: Arbor) {
    let table = SkeletonTable::from_arbor(&skeleton).unwrap();

    assert_eq!(table.id, 17);
    assert_eq!(table.graph.columns, GRAPH_COLUMNS.map(String::from).to_vec());
    assert_eq!(table.graph.data.len(), 6);

    // Root row first, with null parent and confidence
    let root = table.graph.data[0];
    assert_eq!((root.node, root.parent, root.confidence), (1, None, None));
    assert_eq!(root.radius, Some(5.5));

    // Every parent precedes its children
    let mut seen = vec![1];
    for row in &table.graph.data[1..] {
        let parent = row.parent.unwrap();
        assert!(seen.contains(&parent));
        assert!(row.confidence.is_some());
        seen.push(row.node);
    }

    // Connectors sorted by treenode, then connector
    let connectors: Vec<(NodeId, i64)> = table
        .connectors
        .data
        .iter()
        .map(|row| (row.0.treenode, row.0.connector))
        .collect();
    assert_eq!(connectors, vec![(1, 300), (4, 200), (4, 201)]);
}

#[rstest]
fn test_table_round_trip(skeleton: Arbor) {
    let table = SkeletonTable::from_arbor(&skeleton).unwrap();
    let back = table.to_arbor().unwrap();

    assert_eq!(back.id(), skeleton.id());
    assert_eq!(back.graph(), skeleton.graph());
    assert_eq!(back.node_loc(), skeleton.node_loc());
    assert_eq!(back.node_radius(), skeleton.node_radius());
    assert_eq!(back.edge_confidence(), skeleton.edge_confidence());
    assert_eq!(back.tags(), skeleton.tags());
    assert_eq!(back.connectors()[&1], skeleton.connectors()[&1]);
    assert_eq!(back.connectors()[&4].len(), 2);
}

#[rstest]
fn test_json_round_trip(skeleton: Arbor) {
    let text = arbor_to_json(&skeleton).unwrap();
    let back = arbor_from_json(&text).unwrap();

    assert_eq!(back.graph(), skeleton.graph());
    assert_eq!(back.node_loc(), skeleton.node_loc());
    assert_eq!(back.node_radius(), skeleton.node_radius());
    assert_eq!(back.edge_confidence(), skeleton.edge_confidence());
    assert_eq!(back.tags(), skeleton.tags());
}

#[rstest]
fn test_json_round_trip_of_rerooted_tree(skeleton: Arbor) {
    use arbor::model::TreeStructure;

    let rerooted = skeleton.reroot(6).unwrap();
    let back = arbor_from_json(&arbor_to_json(&rerooted).unwrap()).unwrap();
    assert_eq!(back.root().unwrap(), 6);
    assert_eq!(back.graph(), rerooted.graph());
}

#[test]
fn test_empty_arbor_round_trip() {
    let text = arbor_to_json(&Arbor::empty(3)).unwrap();
    let back = arbor_from_json(&text).unwrap();
    assert!(back.is_empty());
    assert_eq!(back.id(), 3);
}

#[test]
fn test_json_format() {
    let text = r#"{
        "id": 9,
        "graph": {
            "columns": ["treenode", "parent", "x", "y", "z", "radius", "confidence"],
            "data": [
                [10, null, 0.0, 0.0, 0.0, 2.0, null],
                [11, 10, 3.0, 4.0, 0.0, null, 5]
            ]
        },
        "connectors": {
            "columns": ["treenode", "connector", "relation", "x", "y", "z"],
            "data": [[11, 50, 0, 3.0, 5.0, 0.0]]
        },
        "tags": {"soma": [10]}
    }"#;
    let skeleton = arbor_from_json(text).unwrap();

    assert_eq!(skeleton.id(), 9);
    assert_eq!(skeleton.root().unwrap(), 10);
    assert_eq!(skeleton.soma().unwrap(), Some(10));
    assert_eq!(skeleton.radius(10), Some(2.0));
    assert_eq!(skeleton.radius(11), None);
    assert_eq!(skeleton.edge_confidence().get(10, 11), Some(&5));
    assert_eq!(skeleton.edge_length().get(10, 11), Some(&5.0));
    assert_eq!(skeleton.connectors()[&11][0].relation, ConnectorRelation::PresynapticTo);
}

// ============= Malformed Input Tests =============

fn table_json(columns: &str, rows: &str) -> String {
    format!(
        r#"{{"id": 1,
            "graph": {{"columns": {columns}, "data": {rows}}},
            "connectors": {{"columns": ["treenode", "connector", "relation", "x", "y", "z"], "data": []}},
            "tags": {{}}}}"#
    )
}

const COLUMNS: &str = r#"["treenode", "parent", "x", "y", "z", "radius", "confidence"]"#;

#[rstest]
#[case::wrong_columns(
    r#"["node", "parent", "x", "y", "z", "radius", "confidence"]"#,
    "[[1, null, 0, 0, 0, null, null]]"
)]
#[case::root_not_first(COLUMNS, "[[2, 1, 0, 0, 0, null, 1], [1, null, 0, 0, 0, null, null]]")]
#[case::missing_confidence(COLUMNS, "[[1, null, 0, 0, 0, null, null], [2, 1, 0, 0, 0, null, null]]")]
#[case::duplicate_node(COLUMNS, "[[1, null, 0, 0, 0, null, null], [1, 1, 0, 0, 0, null, 3]]")]
#[case::second_root(COLUMNS, "[[1, null, 0, 0, 0, null, null], [2, null, 0, 0, 0, null, null]]")]
fn test_malformed_table(#[case] columns: &str, #[case] rows: &str) {
    let err = arbor_from_json(&table_json(columns, rows)).unwrap_err();
    assert_eq!(err.kind(), ArborErrorKind::Interchange);
}

#[test]
fn test_structurally_invalid_table() {
    // 3 claims two different parents
    let rows = "[[1, null, 0, 0, 0, null, null], [2, 1, 0, 0, 0, null, 1], [3, 1, 0, 0, 0, null, 1], [3, 2, 0, 0, 0, null, 1]]";
    let err = arbor_from_json(&table_json(COLUMNS, rows)).unwrap_err();
    // Duplicate rows are caught before the structure is checked
    assert_eq!(err.kind(), ArborErrorKind::Interchange);

    let rows = "[[1, null, 0, 0, 0, null, null], [2, 3, 0, 0, 0, null, 1], [3, 2, 0, 0, 0, null, 1]]";
    let err = arbor_from_json(&table_json(COLUMNS, rows)).unwrap_err();
    assert_eq!(err.kind(), ArborErrorKind::Structural);
}

#[test]
fn test_invalid_json() {
    let err = arbor_from_json("{\"id\": 1, \"graph\": ").unwrap_err();
    assert!(matches!(err, arbor::ArborError::Json(_)));

    let rows = "[[1, null, 0, 0, 0, null, null]]";
    let text = table_json(COLUMNS, rows).replace("\"data\": []", "\"data\": [[1, 5, 7, 0, 0, 0]]");
    let err = arbor_from_json(&text).unwrap_err();
    assert_eq!(err.kind(), ArborErrorKind::Interchange);
}

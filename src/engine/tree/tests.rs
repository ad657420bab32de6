use super::*;
use crate::domain::tree::{DetailedTreeSummary, TreeNode};
use crate::domain::types::NodeKind;
use crate::domain::work_order::{
    FlatNode, MaterialNode, NodeBody, NodeHeader, OperationNode, ParentLink, RawTreeRow,
    WorkOrderNode,
};

// ==========================================
// 测试辅助函数
// ==========================================

fn header(sub_id: &str, sort_key: &str) -> NodeHeader {
    NodeHeader {
        sub_id: sub_id.to_string(),
        sort_key: sort_key.to_string(),
        depth_hint: None,
        status: Some("R".to_string()),
    }
}

/// 创建工单节点（parent: 父工单 SUB_ID + 父工序号）
fn wo(sub_id: &str, sort_key: &str, parent: Option<(&str, Option<i32>)>) -> FlatNode {
    FlatNode {
        header: header(sub_id, sort_key),
        body: NodeBody::WorkOrder(WorkOrderNode {
            parent: parent.map(|(p, seq)| ParentLink {
                sub_id: p.to_string(),
                op_seq: seq,
            }),
            part_id: Some(format!("PART-{}", sub_id)),
            part_description: None,
            order_qty: 1.0,
            work_order_type: Some("W".to_string()),
            start_date: None,
            finish_date: None,
            close_date: None,
        }),
    }
}

/// 创建工序节点
fn op(sub_id: &str, op_seq: i32, sort_key: &str) -> FlatNode {
    FlatNode {
        header: header(sub_id, sort_key),
        body: NodeBody::Operation(OperationNode {
            op_seq,
            resource_id: Some("LATHE".to_string()),
            resource_description: None,
        }),
    }
}

/// 创建物料节点
fn mat(sub_id: &str, op_seq: i32, piece_no: i32, sort_key: &str) -> FlatNode {
    FlatNode {
        header: header(sub_id, sort_key),
        body: NodeBody::Material(MaterialNode {
            op_seq,
            piece_no,
            part_id: Some(format!("RAW-{}", piece_no)),
            part_description: None,
            qty: Some(2.0),
            dimensions: None,
        }),
    }
}

/// 节点简写标签，便于断言顺序
fn label(node: &TreeNode) -> String {
    match &node.node.body {
        NodeBody::WorkOrder(_) => format!("WO:{}", node.node.sub_id()),
        NodeBody::Operation(o) => format!("OP:{}/{}", node.node.sub_id(), o.op_seq),
        NodeBody::Material(m) => {
            format!("MAT:{}/{}/{}", node.node.sub_id(), m.op_seq, m.piece_no)
        }
    }
}

fn child_labels(node: &TreeNode) -> Vec<String> {
    node.children.iter().map(label).collect()
}

/// 按标签查找节点
fn find<'a>(root: &'a TreeNode, wanted: &str) -> &'a TreeNode {
    root.pre_order()
        .into_iter()
        .find(|n| label(n) == wanted)
        .unwrap_or_else(|| panic!("节点 {} 不在树中", wanted))
}

/// 断言每个子节点 depth = 父节点 depth + 1
fn assert_depths(node: &TreeNode) {
    for child in &node.children {
        assert_eq!(child.depth, node.depth + 1, "节点 {} 深度错误", label(child));
        assert_depths(child);
    }
}

/// 根工单 + 一道工序（含物料）+ 子工单 5（挂在工序 10 下,自身工序 20）
fn subordinate_scenario() -> Vec<FlatNode> {
    vec![
        wo("0", "000-0000-0000", None),
        op("0", 10, "000-0010-0000"),
        mat("0", 10, 1, "000-0010-0001"),
        wo("5", "000.005-0000-0000", Some(("0", Some(10)))),
        op("5", 20, "000.005-0020-0000"),
        mat("5", 20, 1, "000.005-0020-0001"),
    ]
}

// ==========================================
// 基本场景
// ==========================================

#[test]
fn test_scenario_single_operation_with_material() {
    // 场景: 根工单 → 工序 → 物料
    let nodes = vec![
        wo("0", "000-0000-0000", None),
        op("0", 10, "000-0010-0000"),
        mat("0", 10, 1, "000-0010-0001"),
    ];

    let result = build_detailed_tree(nodes);
    let root = result.tree.expect("应生成树");

    assert!(root.node.is_root());
    assert_eq!(child_labels(&root), vec!["OP:0/10"]);
    assert_eq!(child_labels(&root.children[0]), vec!["MAT:0/10/1"]);
    assert_eq!(root.depth, 0);
    assert_eq!(root.children[0].depth, 1);
    assert_eq!(root.children[0].children[0].depth, 2);

    assert_eq!(
        result.summary,
        Some(DetailedTreeSummary {
            work_orders: 1,
            operations: 1,
            materials: 1,
            total_nodes: 3,
            dropped_nodes: 0,
        })
    );
}

#[test]
fn test_scenario_subordinate_operations_are_promoted() {
    // 场景: 子工单 5 的工序 20 挂在根工序 10 下,而不是子工单标签下
    let nodes = vec![
        wo("0", "000-0000-0000", None),
        op("0", 10, "000-0010-0000"),
        wo("5", "000.005-0000-0000", Some(("0", Some(10)))),
        op("5", 20, "000.005-0020-0000"),
    ];

    let root = build_detailed_tree(nodes).tree.expect("应生成树");
    let op10 = find(&root, "OP:0/10");

    assert_eq!(child_labels(op10), vec!["WO:5", "OP:5/20"]);
    let label_node = find(&root, "WO:5");
    assert!(label_node.children.is_empty(), "子工单标签不应有子节点");
    assert_eq!(label_node.depth, 2);
    assert_eq!(find(&root, "OP:5/20").depth, 2);
}

#[test]
fn test_scenario_empty_input() {
    let result = build_detailed_tree(Vec::new());
    assert!(result.tree.is_none());
    assert!(result.summary.is_none());

    assert!(build_simplified_tree(Vec::new()).is_none());
}

// ==========================================
// 排序规则
// ==========================================

#[test]
fn test_structural_children_precede_materials() {
    // 排序键中根工序物料 (000-0010-0001) 先于子工单 (000.005-...)
    // 整理后子工单标签与其工序应排在物料之前
    let root = build_detailed_tree(subordinate_scenario())
        .tree
        .expect("应生成树");

    let op10 = find(&root, "OP:0/10");
    assert_eq!(child_labels(op10), vec!["WO:5", "OP:5/20", "MAT:0/10/1"]);

    let op20 = find(&root, "OP:5/20");
    assert_eq!(child_labels(op20), vec!["MAT:5/20/1"]);
    assert_eq!(op20.children[0].depth, 3);
}

#[test]
fn test_sibling_order_follows_sort_key_regardless_of_input_order() {
    let sorted = vec![
        wo("0", "000-0000-0000", None),
        op("0", 10, "000-0010-0000"),
        mat("0", 10, 1, "000-0010-0001"),
        mat("0", 10, 2, "000-0010-0002"),
        op("0", 20, "000-0020-0000"),
        op("0", 30, "000-0030-0000"),
    ];
    let mut shuffled = sorted.clone();
    shuffled.reverse();
    shuffled.swap(1, 4);

    let a = build_detailed_tree(sorted).tree.expect("应生成树");
    let b = build_detailed_tree(shuffled).tree.expect("应生成树");

    assert_eq!(child_labels(&a), vec!["OP:0/10", "OP:0/20", "OP:0/30"]);
    assert_eq!(child_labels(&a.children[0]), vec!["MAT:0/10/1", "MAT:0/10/2"]);
    assert_eq!(a, b);
}

#[test]
fn test_build_is_idempotent() {
    let first = build_detailed_tree(subordinate_scenario());
    let second = build_detailed_tree(subordinate_scenario());
    assert_eq!(first, second);
}

// ==========================================
// 深度重算
// ==========================================

#[test]
fn test_depth_hint_is_overwritten() {
    let mut nodes = subordinate_scenario();
    for node in nodes.iter_mut() {
        node.header.depth_hint = Some(7);
    }

    let root = build_detailed_tree(nodes).tree.expect("应生成树");
    assert_eq!(root.depth, 0);
    assert_depths(&root);
}

#[test]
fn test_multi_level_subordinates() {
    // 0 → OP10 → (WO5, OP5/20 → (WO7, OP7/30 → MAT7/30/1))
    let nodes = vec![
        wo("0", "000-0000-0000", None),
        op("0", 10, "000-0010-0000"),
        wo("5", "000.005-0000-0000", Some(("0", Some(10)))),
        op("5", 20, "000.005-0020-0000"),
        wo("7", "000.005.007-0000-0000", Some(("5", Some(20)))),
        op("7", 30, "000.005.007-0030-0000"),
        mat("7", 30, 1, "000.005.007-0030-0001"),
    ];

    let result = build_detailed_tree(nodes);
    let root = result.tree.expect("应生成树");

    assert_eq!(child_labels(find(&root, "OP:5/20")), vec!["WO:7", "OP:7/30"]);
    assert_eq!(child_labels(find(&root, "OP:7/30")), vec!["MAT:7/30/1"]);
    assert_eq!(find(&root, "MAT:7/30/1").depth, 4);
    assert_depths(&root);
    assert_eq!(root.node_count(), 7);
    assert_eq!(result.summary.map(|s| s.dropped_nodes), Some(0));
}

#[test]
fn test_recalculate_depths_directly() {
    let mut root = TreeNode::leaf(wo("0", "000-0000-0000", None));
    root.depth = 9;
    let mut child = TreeNode::leaf(op("0", 10, "000-0010-0000"));
    child.children.push(TreeNode::leaf(mat("0", 10, 1, "000-0010-0001")));
    root.children.push(child);

    recalculate_depths(&mut root);

    let depths: Vec<u32> = root.pre_order().iter().map(|n| n.depth).collect();
    assert_eq!(depths, vec![0, 1, 2]);
}

#[test]
fn test_order_children_directly_is_stable() {
    let mut root = TreeNode::leaf(op("0", 10, "000-0010-0000"));
    root.children = vec![
        TreeNode::leaf(mat("0", 10, 2, "b")),
        TreeNode::leaf(wo("5", "c", Some(("0", Some(10))))),
        TreeNode::leaf(mat("0", 10, 1, "a")),
        TreeNode::leaf(op("5", 20, "d")),
    ];

    order_children(&mut root);

    assert_eq!(
        child_labels(&root),
        vec!["WO:5", "OP:5/20", "MAT:0/10/2", "MAT:0/10/1"]
    );
}

// ==========================================
// 悬空引用与异常数据
// ==========================================

#[test]
fn test_dangling_material_is_dropped() {
    let nodes = vec![
        wo("0", "000-0000-0000", None),
        op("0", 10, "000-0010-0000"),
        mat("0", 99, 1, "000-0099-0001"),
    ];

    let result = build_detailed_tree(nodes);
    let root = result.tree.expect("应生成树");
    let summary = result.summary.expect("应有汇总");

    assert_eq!(root.node_count(), 2);
    assert_eq!(summary.total_nodes, 3);
    assert_eq!(summary.materials, 1);
    assert_eq!(summary.dropped_nodes, 1);
}

#[test]
fn test_subordinate_with_missing_parent_operation_drops_its_branch() {
    // 子工单 5 指向不存在的工序 40: 标签、工序与物料都应丢弃
    let nodes = vec![
        wo("0", "000-0000-0000", None),
        op("0", 10, "000-0010-0000"),
        wo("5", "000.005-0000-0000", Some(("0", Some(40)))),
        op("5", 20, "000.005-0020-0000"),
        mat("5", 20, 1, "000.005-0020-0001"),
    ];

    let result = build_detailed_tree(nodes);
    let root = result.tree.expect("应生成树");

    assert_eq!(root.node_count(), 2);
    assert_eq!(result.summary.map(|s| s.dropped_nodes), Some(3));
}

#[test]
fn test_dropped_count_matches_missing_parents() {
    let mut nodes = subordinate_scenario();
    // 两个悬空节点: 未知工单的工序、未知工序的物料
    nodes.push(op("9", 10, "000.009-0010-0000"));
    nodes.push(mat("0", 55, 3, "000-0055-0003"));
    // 缺少父级链接的非根工单
    nodes.push(wo("8", "000.008-0000-0000", None));

    let result = build_detailed_tree(nodes);
    let root = result.tree.expect("应生成树");
    let summary = result.summary.expect("应有汇总");

    assert_eq!(summary.total_nodes, 9);
    assert_eq!(summary.dropped_nodes, 3);
    assert_eq!(root.node_count(), 6);
}

#[test]
fn test_unreachable_cycle_terminates_and_is_dropped() {
    // 工单 5 挂在 6 的工序下,工单 6 又挂在 5 的工序下: 与根不连通
    let nodes = vec![
        wo("0", "000-0000-0000", None),
        op("0", 10, "000-0010-0000"),
        wo("5", "000.005-0000-0000", Some(("6", Some(60)))),
        op("5", 50, "000.005-0050-0000"),
        wo("6", "000.006-0000-0000", Some(("5", Some(50)))),
        op("6", 60, "000.006-0060-0000"),
    ];

    let result = build_detailed_tree(nodes);
    let root = result.tree.expect("应生成树");

    assert_eq!(root.node_count(), 2);
    assert_eq!(result.summary.map(|s| s.dropped_nodes), Some(4));
}

#[test]
fn test_missing_root_yields_no_tree_but_summary() {
    let nodes = vec![op("0", 10, "000-0010-0000"), mat("0", 10, 1, "000-0010-0001")];

    let result = build_detailed_tree(nodes);
    assert!(result.tree.is_none());
    let summary = result.summary.expect("非空输入应有汇总");
    assert_eq!(summary.total_nodes, 2);
    assert_eq!(summary.dropped_nodes, 2);
}

#[test]
fn test_single_root_without_parent() {
    let root = build_detailed_tree(subordinate_scenario())
        .tree
        .expect("应生成树");

    let roots: Vec<&TreeNode> = root
        .pre_order()
        .into_iter()
        .filter(|n| n.node.is_root())
        .collect();
    assert_eq!(roots.len(), 1);
    assert!(roots[0].node.parent_link().is_none());
}

#[test]
fn test_duplicate_root_is_dropped() {
    let nodes = vec![
        wo("0", "000-0000-0000", None),
        wo("0", "000-0000-0001", None),
        op("0", 10, "000-0010-0000"),
    ];

    let result = build_detailed_tree(nodes);
    assert_eq!(result.tree.map(|t| t.node_count()), Some(2));
    assert_eq!(result.summary.map(|s| s.dropped_nodes), Some(1));
}

// ==========================================
// 简化树
// ==========================================

#[test]
fn test_simplified_tree_nests_by_parent_sub_id() {
    let nodes = vec![
        wo("0", "000", None),
        wo("1", "000.001", Some(("0", None))),
        wo("3", "000.001.003", Some(("1", None))),
        wo("2", "000.002", Some(("0", None))),
    ];

    let root = build_simplified_tree(nodes).expect("应生成树");

    assert_eq!(child_labels(&root), vec!["WO:1", "WO:2"]);
    assert_eq!(child_labels(&root.children[0]), vec!["WO:3"]);
    assert_eq!(find(&root, "WO:3").depth, 2);
    assert_depths(&root);
}

#[test]
fn test_simplified_tree_drops_orphans_and_non_work_orders() {
    let nodes = vec![
        wo("0", "000", None),
        wo("1", "000.001", Some(("0", None))),
        wo("4", "000.004", Some(("9", None))),
        op("0", 10, "000-0010-0000"),
    ];

    let root = build_simplified_tree(nodes).expect("应生成树");
    assert_eq!(root.node_count(), 2);
}

#[test]
fn test_simplified_tree_without_root() {
    let nodes = vec![wo("1", "000.001", Some(("0", None)))];
    assert!(build_simplified_tree(nodes).is_none());
}

// ==========================================
// 原始行入口
// ==========================================

fn raw(node_type: &str, sub_id: &str, sort_key: &str) -> RawTreeRow {
    RawTreeRow {
        node_type: Some(node_type.to_string()),
        sub_id: Some(sub_id.to_string()),
        sort_key: Some(sort_key.to_string()),
        ..Default::default()
    }
}

#[test]
fn test_rows_with_missing_identity_are_excluded() {
    let mut op_row = raw("OP", "0", "000-0010-0000");
    op_row.op_seq = Some(10);
    let broken_op = raw("OP", "0", "000-0020-0000");

    let builder = WorkOrderTreeBuilder::new();
    let result = builder.build_detailed_from_rows(vec![
        raw("WO", "0", "000-0000-0000"),
        op_row,
        broken_op,
    ]);

    let summary = result.summary.expect("应有汇总");
    assert_eq!(summary.total_nodes, 2);
    assert_eq!(summary.operations, 1);
    assert_eq!(result.tree.map(|t| t.node_count()), Some(2));
}

#[test]
fn test_simplified_from_rows_counts_work_orders() {
    let mut child = raw("WO", "1", "000.001");
    child.parent_sub_id = Some("0".to_string());

    let result = WorkOrderTreeBuilder::new()
        .build_simplified_from_rows(vec![raw("WO", "0", "000"), child]);

    assert_eq!(result.total_work_orders, 2);
    assert_eq!(result.tree.map(|t| t.children.len()), Some(1));
}

#[test]
fn test_index_keeps_first_duplicate() {
    let nodes = vec![
        op("0", 10, "a"),
        op("0", 10, "b"),
        wo("0", "c", None),
        mat("0", 10, 1, "d"),
    ];
    let index = TreeIndex::build(&nodes);

    assert_eq!(index.operation("0", 10), Some(0));
    assert_eq!(index.work_order("0"), Some(2));
    assert_eq!(index.operation_count(), 1);
    assert_eq!(index.work_order_count(), 1);
    assert!(index.operation("0", 20).is_none());
    assert!(TreeIndex::build(&[]).is_empty());
}

/// 循环需求展开后的重复副本: 0 → 1 → 2 → 1
fn cyclic_copies_scenario() -> Vec<FlatNode> {
    vec![
        wo("0", "000-0000-0000", None),
        op("0", 10, "000-0010-0000"),
        wo("1", "000.001-0000-0000", Some(("0", Some(10)))),
        op("1", 20, "000.001-0020-0000"),
        mat("1", 20, 1, "000.001-0020-0001"),
        wo("2", "000.001.002-0000-0000", Some(("1", Some(20)))),
        op("2", 30, "000.001.002-0030-0000"),
        // 第二次出现的工单 1 及其工序、物料
        wo("1", "000.001.002.001-0000-0000", Some(("2", Some(30)))),
        op("1", 20, "000.001.002.001-0020-0000"),
        mat("1", 20, 1, "000.001.002.001-0020-0001"),
    ]
}

fn occurrences(root: &TreeNode, wanted: &str) -> usize {
    root.pre_order().into_iter().filter(|n| label(n) == wanted).count()
}

#[test]
fn test_detailed_duplicate_identities_attach_once() {
    let result = build_detailed_tree(cyclic_copies_scenario());
    let root = result.tree.expect("应生成树");

    for wanted in ["WO:0", "WO:1", "WO:2", "OP:0/10", "OP:1/20", "OP:2/30", "MAT:1/20/1"] {
        assert_eq!(occurrences(&root, wanted), 1, "{} 应只出现一次", wanted);
    }
    // 保留排序键最小的副本
    assert_eq!(find(&root, "WO:1").node.header.sort_key, "000.001-0000-0000");
    assert!(child_labels(find(&root, "OP:2/30")).is_empty());

    let summary = result.summary.expect("应有汇总");
    assert_eq!(summary.total_nodes, 10);
    assert_eq!(summary.dropped_nodes, 3);
    assert_eq!(root.node_count(), 7);
    assert_depths(&root);
}

#[test]
fn test_simplified_duplicate_work_order_attaches_once() {
    let work_orders: Vec<FlatNode> = cyclic_copies_scenario()
        .into_iter()
        .filter(|n| n.kind() == NodeKind::WorkOrder)
        .collect();

    let root = build_simplified_tree(work_orders).expect("应生成树");

    assert_eq!(occurrences(&root, "WO:1"), 1);
    assert_eq!(root.node_count(), 3);
    assert_eq!(child_labels(&root), vec!["WO:1"]);
    assert_eq!(child_labels(&root.children[0]), vec!["WO:2"]);
    assert!(root.children[0].children[0].children.is_empty());
}

// ==========================================
// JSON 输出
// ==========================================

#[test]
fn test_tree_serializes_with_node_type_tag() {
    let root = build_detailed_tree(subordinate_scenario())
        .tree
        .expect("应生成树");
    let json = serde_json::to_value(&root).unwrap();

    assert_eq!(json["nodeType"], "WO");
    assert_eq!(json["subId"], "0");
    assert_eq!(json["depth"], 0);
    assert!(json.get("parent").is_none());

    let op10 = &json["children"][0];
    assert_eq!(op10["nodeType"], "OP");
    assert_eq!(op10["opSeq"], 10);

    let label = &op10["children"][0];
    assert_eq!(label["nodeType"], "WO");
    assert_eq!(label["children"].as_array().map(|c| c.len()), Some(0));
    assert_eq!(root.kind(), NodeKind::WorkOrder);
}

// ==========================================
// 制造ERP工单树 - 子节点排序
// ==========================================
// 规则: 结构节点（工单标签/工序）在前,物料在后
//       组内保持原有相对顺序（稳定划分）
// ==========================================

use crate::domain::tree::TreeNode;

/// 递归整理子节点顺序（根到叶）
pub fn order_children(node: &mut TreeNode) {
    if node.children.is_empty() {
        return;
    }

    let (mut structural, materials): (Vec<TreeNode>, Vec<TreeNode>) = node
        .children
        .drain(..)
        .partition(|child| child.kind().is_structural());
    structural.extend(materials);
    node.children = structural;

    for child in node.children.iter_mut() {
        order_children(child);
    }
}

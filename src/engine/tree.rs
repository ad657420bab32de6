// ==========================================
// 制造ERP工单树 - 工单树重建引擎
// ==========================================
// 职责: 扁平行 → 嵌套有序树
// 流程: 节点索引 → 树组装 → 子节点排序 → 深度重算
// ==========================================
// 注: 引擎为纯函数,不访问数据源
// ==========================================

mod assembler;
mod depth;
mod index;
mod ordering;

#[cfg(test)]
mod tests;

pub use assembler::WorkOrderTreeBuilder;
pub use depth::recalculate_depths;
pub use index::{OperationKey, TreeIndex};
pub use ordering::order_children;

use crate::domain::tree::{DetailedTree, TreeNode};
use crate::domain::work_order::FlatNode;

/// 构建简化树（仅工单）,空输入返回 None
pub fn build_simplified_tree(nodes: Vec<FlatNode>) -> Option<TreeNode> {
    WorkOrderTreeBuilder::new().build_simplified(nodes)
}

/// 构建详细树（工单 + 工序 + 物料）及汇总
pub fn build_detailed_tree(nodes: Vec<FlatNode>) -> DetailedTree {
    WorkOrderTreeBuilder::new().build_detailed(nodes)
}

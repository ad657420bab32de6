// ==========================================
// 制造ERP工单树 - 领域模型层
// ==========================================
// 职责: 定义扁平节点、树节点、层级遍历输入
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod tree;
pub mod types;
pub mod work_order;

// 重导出核心类型
pub use tree::{DetailedTree, DetailedTreeSummary, SimplifiedTree, TreeNode};
pub use types::{NodeKind, ROOT_SUB_ID};
pub use work_order::{
    FlatNode, HierarchyEdge, MaterialNode, NodeBody, NodeHeader, OperationNode, ParentLink,
    RawTreeRow, RowRejection, WorkOrderKey, WorkOrderNode, WorkOrderRow,
};

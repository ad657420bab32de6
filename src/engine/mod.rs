// ==========================================
// 制造ERP工单树 - 引擎层
// ==========================================
// 职责: 工单树重建与层级计算,不拼 SQL
// 红线: Engine 不访问数据库,输入输出均为领域对象
// ==========================================

pub mod hierarchy;
pub mod tree;

// 重导出核心引擎
pub use hierarchy::{compute_hierarchy, HierarchyReport, HierarchyWalker};
pub use tree::{build_detailed_tree, build_simplified_tree, WorkOrderTreeBuilder};

// ==========================================
// 制造ERP工单树 - 工单层级遍历引擎
// ==========================================
// 职责: 由 (子, 父) 边计算每个工单的深度与路径
// 输入: 工单列表 + 父子边（不依赖排序键）
// 输出: 层级条目（按路径排序）+ 诊断信息
// ==========================================
// 红线: 环与超深不得导致无限遍历
// ==========================================

mod core;
mod outcome;


pub use self::core::{HierarchyWalker, DEFAULT_MAX_DEPTH};
pub use outcome::{
    AscentOutcome, DiagnosticKind, HierarchyDiagnostic, HierarchyEntry, HierarchyReport,
    CYCLE_SENTINEL_DEPTH, CYCLE_SENTINEL_PATH, PATH_SEPARATOR,
};

use crate::domain::work_order::{HierarchyEdge, WorkOrderRow};

/// 计算工单层级（一次性调用,备忘表仅在本次调用内有效）
pub fn compute_hierarchy(
    work_orders: &[WorkOrderRow],
    edges: &[HierarchyEdge],
    max_depth: u32,
) -> HierarchyReport {
    HierarchyWalker::new(max_depth).compute(work_orders, edges)
}

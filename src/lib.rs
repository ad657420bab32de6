// ==========================================
// 制造ERP工单树 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 工单层级重建（扁平行 → 有序嵌套树 / 深度 + 路径）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 树重建与层级遍历
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{NodeKind, ROOT_SUB_ID};

// 领域实体
pub use domain::{
    DetailedTree, DetailedTreeSummary, FlatNode, HierarchyEdge, RawTreeRow, SimplifiedTree,
    TreeNode, WorkOrderKey, WorkOrderRow,
};

// 引擎
pub use engine::hierarchy::{AscentOutcome, HierarchyDiagnostic, HierarchyEntry};
pub use engine::{
    build_detailed_tree, build_simplified_tree, compute_hierarchy, HierarchyReport,
    HierarchyWalker, WorkOrderTreeBuilder,
};

// API
pub use api::{ApiError, ApiResult, WorkOrderTreeApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "制造ERP工单树";

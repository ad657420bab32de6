// ==========================================
// 制造ERP工单树 - 数据仓储层
// ==========================================
// 红线: Repository 不含组装逻辑
// ==========================================
// 职责: 提供工单树数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod work_order_row_source;
pub mod work_order_tree_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use work_order_row_source::WorkOrderRowSource;
pub use work_order_tree_repo::WorkOrderTreeRepository;

// ==========================================
// 制造ERP工单树 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行与上层服务调用
// ==========================================

pub mod error;
pub mod work_order_tree_api;

// 重导出核心类型
pub use error::{validate_required, ApiError, ApiResult};
pub use work_order_tree_api::WorkOrderTreeApi;

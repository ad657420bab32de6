// ==========================================
// 制造ERP工单树 - 数据库路径
// ==========================================

use std::path::PathBuf;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "ERP_WO_TREE_DB_PATH";

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 ERP_WO_TREE_DB_PATH（非空时）
/// - 否则: 用户数据目录/erp-work-order-tree/erp_work_order_tree.db
/// - 无法获取用户数据目录时: ./erp_work_order_tree.db
pub fn get_default_db_path() -> String {
    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./erp_work_order_tree.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("erp-work-order-tree");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("erp_work_order_tree.db");
        }
    }

    path.to_string_lossy().to_string()
}

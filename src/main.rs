// ==========================================
// 制造ERP工单树 - 命令行入口
// ==========================================
// 用法: erp-work-order-tree <simplified|detailed|hierarchy> <base_id> <lot_id> [db_path]
// 输出: JSON（stdout）,日志输出到 stderr
// ==========================================

use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use erp_work_order_tree::api::WorkOrderTreeApi;
use erp_work_order_tree::config::{get_default_db_path, ConfigManager};
use erp_work_order_tree::db::{init_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use erp_work_order_tree::repository::WorkOrderTreeRepository;
use erp_work_order_tree::{logging, APP_NAME, VERSION};

const USAGE: &str = "用法: erp-work-order-tree <simplified|detailed|hierarchy> <base_id> <lot_id> [db_path]";

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    }

    match run(&args[1], &args[2], &args[3], args.get(4).cloned()).await {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "执行失败");
            eprintln!("错误: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(
    command: &str,
    base_id: &str,
    lot_id: &str,
    db_path: Option<String>,
) -> anyhow::Result<String> {
    let db_path = db_path.unwrap_or_else(get_default_db_path);
    tracing::info!(app = APP_NAME, version = VERSION, db_path = %db_path, "使用数据库");

    let conn = open_sqlite_connection(&db_path)?;
    match read_schema_version(&conn)? {
        None => {
            tracing::info!("数据库未初始化,创建表结构");
            init_schema(&conn)?;
        }
        Some(v) if v != CURRENT_SCHEMA_VERSION => {
            tracing::warn!(
                schema_version = v,
                expected = CURRENT_SCHEMA_VERSION,
                "数据库 schema_version 与程序不一致"
            );
        }
        Some(_) => {}
    }

    let conn = Arc::new(Mutex::new(conn));
    let repo = Arc::new(WorkOrderTreeRepository::from_connection(conn.clone()));
    let config = ConfigManager::from_connection(conn).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let api = WorkOrderTreeApi::new(repo).with_config(Arc::new(config));

    let json = match command {
        "simplified" => serde_json::to_string_pretty(&api.get_simplified_tree(base_id, lot_id).await?)?,
        "detailed" => serde_json::to_string_pretty(&api.get_detailed_tree(base_id, lot_id).await?)?,
        "hierarchy" => serde_json::to_string_pretty(&api.get_hierarchy(base_id, lot_id).await?)?,
        other => anyhow::bail!("未知命令: {}\n{}", other, USAGE),
    };
    Ok(json)
}

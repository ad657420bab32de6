// ==========================================
// 制造ERP工单树 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发读写时的偶发 busy 错误
// - 提供 ERP 工单表结构的建库脚本（测试与命令行首次运行使用）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 只用于提示/告警（不做自动迁移），避免静默在旧库上运行。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 创建工单树所需的表结构（幂等）
///
/// 表:
/// - work_order: 工单头 (BASE_ID + LOT_ID + SUB_ID)
/// - operation: 工序
/// - requirement: 物料需求; subord_wo_sub_id 非空表示子工单引用
/// - part / shop_resource: 描述查找表
/// - config_kv: 配置
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS part (
            id TEXT PRIMARY KEY,
            description TEXT
        );

        CREATE TABLE IF NOT EXISTS shop_resource (
            id TEXT PRIMARY KEY,
            description TEXT
        );

        CREATE TABLE IF NOT EXISTS work_order (
            base_id TEXT NOT NULL,
            lot_id TEXT NOT NULL,
            sub_id TEXT NOT NULL,
            part_id TEXT,
            desired_qty REAL,
            status TEXT,
            type TEXT,
            sched_start_date TEXT,
            sched_finish_date TEXT,
            close_date TEXT,
            PRIMARY KEY (base_id, lot_id, sub_id)
        );

        CREATE TABLE IF NOT EXISTS operation (
            workorder_base_id TEXT NOT NULL,
            workorder_lot_id TEXT NOT NULL,
            workorder_sub_id TEXT NOT NULL,
            sequence_no INTEGER NOT NULL,
            resource_id TEXT,
            status TEXT,
            PRIMARY KEY (workorder_base_id, workorder_lot_id, workorder_sub_id, sequence_no)
        );

        CREATE TABLE IF NOT EXISTS requirement (
            workorder_base_id TEXT NOT NULL,
            workorder_lot_id TEXT NOT NULL,
            workorder_sub_id TEXT NOT NULL,
            operation_seq_no INTEGER NOT NULL,
            piece_no INTEGER NOT NULL,
            part_id TEXT,
            subord_wo_sub_id TEXT,
            calc_qty REAL,
            status TEXT,
            dimensions TEXT,
            PRIMARY KEY (workorder_base_id, workorder_lot_id, workorder_sub_id, operation_seq_no, piece_no)
        );

        CREATE INDEX IF NOT EXISTS idx_requirement_subord
            ON requirement (workorder_base_id, workorder_lot_id, subord_wo_sub_id);

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

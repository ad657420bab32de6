// ==========================================
// 制造ERP工单树 - 工单树数据仓储
// ==========================================
// 职责: 递归查询工单/工序/物料需求,输出带排序键的扁平行
// 红线: Repository 不含组装逻辑,只负责取数与排序键拼接
// ==========================================
// 排序键格式:
//   工单段: SUB_ID 左补零 3 位,按层级以 "." 连接（根 "000",子 "000.005"）
//   工序段: "-" + 工序号左补零 4 位
//   件号段: "-" + 件号左补零 4 位
//   工单行以 "-0000-0000" 结尾
// ==========================================

use crate::domain::work_order::{HierarchyEdge, RawTreeRow, WorkOrderKey, WorkOrderRow};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::work_order_row_source::WorkOrderRowSource;
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// 递归查询的最大工单层级（防止脏数据中的环导致无限递归）
pub const MAX_RECURSION_LEVELS: i32 = 64;

// 工单层级递归 CTE
// ?1 = base_id, ?2 = lot_id, ?3 = 深度上限, ?4 = 每层深度步长
const WO_TREE_CTE: &str = r#"
    wo_tree(
        sub_id, part_id, order_qty, status, wo_type,
        start_date, finish_date, close_date,
        parent_sub_id, parent_op_seq, depth, sort_path
    ) AS (
        SELECT
            wo.sub_id, wo.part_id, IFNULL(wo.desired_qty, 0.0), wo.status, wo.type,
            wo.sched_start_date, wo.sched_finish_date, wo.close_date,
            NULL, NULL, 0, substr('000' || wo.sub_id, -3)
        FROM work_order wo
        WHERE wo.base_id = ?1 AND wo.lot_id = ?2 AND wo.sub_id = '0'

        UNION ALL

        SELECT
            wo.sub_id, wo.part_id, IFNULL(wo.desired_qty, 0.0), wo.status, wo.type,
            wo.sched_start_date, wo.sched_finish_date, wo.close_date,
            r.workorder_sub_id, r.operation_seq_no, t.depth + ?4,
            t.sort_path || '.' || substr('000' || wo.sub_id, -3)
        FROM wo_tree t
        JOIN requirement r
          ON r.workorder_base_id = ?1
         AND r.workorder_lot_id = ?2
         AND r.workorder_sub_id = t.sub_id
         AND r.subord_wo_sub_id IS NOT NULL
        JOIN work_order wo
          ON wo.base_id = ?1
         AND wo.lot_id = ?2
         AND wo.sub_id = r.subord_wo_sub_id
        WHERE t.depth < ?3
    )
"#;

// ==========================================
// WorkOrderTreeRepository - 工单树仓储
// ==========================================
pub struct WorkOrderTreeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkOrderTreeRepository {
    /// 创建新的 WorkOrderTreeRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询简化树原始行（工单层级,深度步长 1）
    pub fn find_simplified_rows(&self, key: &WorkOrderKey) -> RepositoryResult<Vec<RawTreeRow>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            WITH RECURSIVE {cte}
            SELECT
                t.sub_id, t.part_id, p.description, t.order_qty, t.status, t.wo_type,
                t.start_date, t.finish_date, t.close_date,
                t.parent_sub_id, t.depth, t.sort_path
            FROM wo_tree t
            LEFT JOIN part p ON p.id = t.part_id
            ORDER BY t.sort_path
            "#,
            cte = WO_TREE_CTE
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![key.base_id, key.lot_id, MAX_RECURSION_LEVELS, 1],
            |row| {
                Ok(RawTreeRow {
                    node_type: Some("WO".to_string()),
                    sub_id: row.get(0)?,
                    part_id: row.get(1)?,
                    part_description: row.get(2)?,
                    qty: row.get(3)?,
                    status: row.get(4)?,
                    work_order_type: row.get(5)?,
                    start_date: parse_date(row, 6)?,
                    finish_date: parse_date(row, 7)?,
                    close_date: parse_date(row, 8)?,
                    parent_sub_id: row.get(9)?,
                    depth: row.get(10)?,
                    sort_key: row.get(11)?,
                    ..Default::default()
                })
            },
        )?;

        let result = rows.collect::<Result<Vec<_>, _>>()?;
        debug!(
            base_id = %key.base_id,
            lot_id = %key.lot_id,
            rows = result.len(),
            "简化树原始行查询完成"
        );
        Ok(result)
    }

    /// 查询详细树原始行（工单深度步长 2: 子工单与物料同级挂在父工序下）
    pub fn find_detailed_rows(&self, key: &WorkOrderKey) -> RepositoryResult<Vec<RawTreeRow>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            WITH RECURSIVE {cte},
            all_nodes(
                node_type, depth, sort_key, sub_id, op_seq, piece_no,
                parent_sub_id, parent_op_seq, part_id, qty, status, wo_type,
                start_date, finish_date, close_date, resource_id, dimensions
            ) AS (
                -- 工单
                SELECT
                    'WO', w.depth, w.sort_path || '-0000-0000', w.sub_id, NULL, NULL,
                    w.parent_sub_id, w.parent_op_seq, w.part_id, w.order_qty, w.status, w.wo_type,
                    w.start_date, w.finish_date, w.close_date, NULL, NULL
                FROM wo_tree w

                UNION ALL

                -- 工序（深度 = 工单深度 + 1）
                SELECT
                    'OP', w.depth + 1,
                    w.sort_path || '-' || printf('%04d', op.sequence_no) || '-0000',
                    op.workorder_sub_id, op.sequence_no, NULL,
                    NULL, NULL, NULL, NULL, op.status, NULL,
                    NULL, NULL, NULL, op.resource_id, NULL
                FROM operation op
                JOIN wo_tree w ON op.workorder_sub_id = w.sub_id
                WHERE op.workorder_base_id = ?1 AND op.workorder_lot_id = ?2

                UNION ALL

                -- 物料需求（深度 = 工单深度 + 2）
                SELECT
                    'MAT', w.depth + 2,
                    w.sort_path || '-' || printf('%04d', r.operation_seq_no)
                        || '-' || printf('%04d', r.piece_no),
                    r.workorder_sub_id, r.operation_seq_no, r.piece_no,
                    NULL, NULL, r.part_id, r.calc_qty, r.status, NULL,
                    NULL, NULL, NULL, NULL, r.dimensions
                FROM requirement r
                JOIN wo_tree w ON r.workorder_sub_id = w.sub_id
                WHERE r.workorder_base_id = ?1 AND r.workorder_lot_id = ?2
                  AND r.subord_wo_sub_id IS NULL
            )
            SELECT
                n.node_type, n.depth, n.sort_key, n.sub_id, n.op_seq, n.piece_no,
                n.parent_sub_id, n.parent_op_seq, n.part_id, p.description, n.qty,
                n.status, n.wo_type, n.start_date, n.finish_date, n.close_date,
                n.resource_id, sr.description, n.dimensions
            FROM all_nodes n
            LEFT JOIN part p ON p.id = n.part_id
            LEFT JOIN shop_resource sr ON sr.id = n.resource_id
            ORDER BY n.sort_key
            "#,
            cte = WO_TREE_CTE
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![key.base_id, key.lot_id, MAX_RECURSION_LEVELS * 2, 2],
            |row| {
                Ok(RawTreeRow {
                    node_type: row.get(0)?,
                    depth: row.get(1)?,
                    sort_key: row.get(2)?,
                    sub_id: row.get(3)?,
                    op_seq: row.get(4)?,
                    piece_no: row.get(5)?,
                    parent_sub_id: row.get(6)?,
                    parent_op_seq: row.get(7)?,
                    part_id: row.get(8)?,
                    part_description: row.get(9)?,
                    qty: row.get(10)?,
                    status: row.get(11)?,
                    work_order_type: row.get(12)?,
                    start_date: parse_date(row, 13)?,
                    finish_date: parse_date(row, 14)?,
                    close_date: parse_date(row, 15)?,
                    resource_id: row.get(16)?,
                    resource_description: row.get(17)?,
                    dimensions: row.get(18)?,
                })
            },
        )?;

        let result = rows.collect::<Result<Vec<_>, _>>()?;
        debug!(
            base_id = %key.base_id,
            lot_id = %key.lot_id,
            rows = result.len(),
            "详细树原始行查询完成"
        );
        Ok(result)
    }

    /// 查询工单列表（层级遍历输入）
    pub fn find_work_orders(&self, key: &WorkOrderKey) -> RepositoryResult<Vec<WorkOrderRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                wo.sub_id, wo.part_id, p.description,
                IFNULL(wo.desired_qty, 0.0), wo.status, wo.type
            FROM work_order wo
            LEFT JOIN part p ON p.id = wo.part_id
            WHERE wo.base_id = ?1 AND wo.lot_id = ?2
            ORDER BY wo.sub_id
            "#,
        )?;

        let rows = stmt.query_map(params![key.base_id, key.lot_id], |row| {
            Ok(WorkOrderRow {
                sub_id: row.get(0)?,
                part_id: row.get(1)?,
                part_description: row.get(2)?,
                order_qty: row.get(3)?,
                status: row.get(4)?,
                work_order_type: row.get(5)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 查询父子边（来自物料需求的子工单引用）
    pub fn find_edges(&self, key: &WorkOrderKey) -> RepositoryResult<Vec<HierarchyEdge>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT r.subord_wo_sub_id, r.workorder_sub_id
            FROM requirement r
            WHERE r.workorder_base_id = ?1 AND r.workorder_lot_id = ?2
              AND r.subord_wo_sub_id IS NOT NULL
            ORDER BY r.workorder_sub_id, r.operation_seq_no, r.piece_no
            "#,
        )?;

        let rows = stmt.query_map(params![key.base_id, key.lot_id], |row| {
            Ok(HierarchyEdge {
                child_sub_id: row.get(0)?,
                parent_sub_id: row.get(1)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

// ==========================================
// WorkOrderRowSource Trait 实现
// ==========================================
#[async_trait]
impl WorkOrderRowSource for WorkOrderTreeRepository {
    async fn fetch_simplified_nodes(&self, key: &WorkOrderKey) -> RepositoryResult<Vec<RawTreeRow>> {
        self.find_simplified_rows(key)
    }

    async fn fetch_detailed_nodes(&self, key: &WorkOrderKey) -> RepositoryResult<Vec<RawTreeRow>> {
        self.find_detailed_rows(key)
    }

    async fn fetch_work_orders_and_edges(
        &self,
        key: &WorkOrderKey,
    ) -> RepositoryResult<(Vec<WorkOrderRow>, Vec<HierarchyEdge>)> {
        let work_orders = self.find_work_orders(key)?;
        let edges = self.find_edges(key)?;
        debug!(
            base_id = %key.base_id,
            lot_id = %key.lot_id,
            work_orders = work_orders.len(),
            edges = edges.len(),
            "层级遍历输入查询完成"
        );
        Ok((work_orders, edges))
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 日期列以 TEXT (YYYY-MM-DD) 存储,无法解析时视为空
fn parse_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    Ok(row
        .get::<_, Option<String>>(idx)?
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()))
}

// ==========================================
// 制造ERP工单树 - 工单树 API
// ==========================================
// 职责: 参数校验 → 行源取数 → 引擎组装/遍历
// ==========================================

use std::sync::Arc;
use tracing::{debug, info};

use crate::api::error::{validate_required, ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::tree::{DetailedTree, SimplifiedTree};
use crate::domain::work_order::WorkOrderKey;
use crate::engine::hierarchy::{HierarchyReport, HierarchyWalker, DEFAULT_MAX_DEPTH};
use crate::engine::tree::WorkOrderTreeBuilder;
use crate::repository::WorkOrderRowSource;

// ==========================================
// WorkOrderTreeApi - 工单树 API
// ==========================================

/// 工单树API
///
/// 职责：
/// 1. 简化树查询（仅工单）
/// 2. 详细树查询（工单 + 工序 + 物料）及汇总
/// 3. 工单层级（深度 + 路径,带环检测）
pub struct WorkOrderTreeApi {
    row_source: Arc<dyn WorkOrderRowSource>,
    config: Option<Arc<ConfigManager>>,
    builder: WorkOrderTreeBuilder,
}

impl WorkOrderTreeApi {
    /// 创建新的WorkOrderTreeApi实例（最大深度使用默认值）
    pub fn new(row_source: Arc<dyn WorkOrderRowSource>) -> Self {
        Self {
            row_source,
            config: None,
            builder: WorkOrderTreeBuilder::new(),
        }
    }

    /// 从配置读取最大深度
    pub fn with_config(mut self, config: Arc<ConfigManager>) -> Self {
        self.config = Some(config);
        self
    }

    /// 查询简化树
    ///
    /// # 返回
    /// - Ok(SimplifiedTree): 工单不存在时 tree 为 None、total_work_orders 为 0
    /// - Err(ApiError::InvalidInput): BASE_ID / LOT_ID 为空
    pub async fn get_simplified_tree(&self, base_id: &str, lot_id: &str) -> ApiResult<SimplifiedTree> {
        let key = Self::validate_key(base_id, lot_id)?;

        let rows = self.row_source.fetch_simplified_nodes(&key).await?;
        debug!(base_id = %key.base_id, lot_id = %key.lot_id, rows = rows.len(), "简化树取数完成");

        Ok(self.builder.build_simplified_from_rows(rows))
    }

    /// 查询详细树
    ///
    /// # 返回
    /// - Ok(DetailedTree): 工单不存在时 tree 与 summary 均为 None
    pub async fn get_detailed_tree(&self, base_id: &str, lot_id: &str) -> ApiResult<DetailedTree> {
        let key = Self::validate_key(base_id, lot_id)?;

        let rows = self.row_source.fetch_detailed_nodes(&key).await?;
        debug!(base_id = %key.base_id, lot_id = %key.lot_id, rows = rows.len(), "详细树取数完成");

        Ok(self.builder.build_detailed_from_rows(rows))
    }

    /// 查询工单层级（深度 + 路径）
    pub async fn get_hierarchy(&self, base_id: &str, lot_id: &str) -> ApiResult<HierarchyReport> {
        let key = Self::validate_key(base_id, lot_id)?;
        let max_depth = self.max_depth()?;

        let (work_orders, edges) = self.row_source.fetch_work_orders_and_edges(&key).await?;
        let report = HierarchyWalker::new(max_depth).compute(&work_orders, &edges);

        if !report.diagnostics.is_empty() {
            info!(
                base_id = %key.base_id,
                lot_id = %key.lot_id,
                diagnostics = report.diagnostics.len(),
                "工单层级存在诊断信息"
            );
        }
        Ok(report)
    }

    /// 当前生效的最大深度
    pub fn max_depth(&self) -> ApiResult<u32> {
        match &self.config {
            Some(config) => config
                .get_hierarchy_max_depth()
                .map_err(|e| ApiError::ConfigError(e.to_string())),
            None => Ok(DEFAULT_MAX_DEPTH),
        }
    }

    fn validate_key(base_id: &str, lot_id: &str) -> ApiResult<WorkOrderKey> {
        let base_id = validate_required(base_id, "BASE_ID")?;
        let lot_id = validate_required(lot_id, "LOT_ID")?;
        Ok(WorkOrderKey::new(base_id, lot_id))
    }
}

// ==========================================
// 制造ERP工单树 - 工单行源 Trait
// ==========================================
// 职责: 定义工单树重建所需的数据访问接口（不包含组装逻辑）
// 红线: 行源只负责取数,排序键由行源计算,嵌套由引擎完成
// ==========================================

use crate::domain::work_order::{HierarchyEdge, RawTreeRow, WorkOrderKey, WorkOrderRow};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// WorkOrderRowSource Trait
// ==========================================
// 用途: 工单树原始行获取
// 实现者: WorkOrderTreeRepository（使用 rusqlite）
#[async_trait]
pub trait WorkOrderRowSource: Send + Sync {
    /// 获取简化树原始行（仅工单）
    ///
    /// # 返回
    /// - Ok(Vec<RawTreeRow>): 按排序键排序的工单行,工单不存在时为空
    async fn fetch_simplified_nodes(&self, key: &WorkOrderKey) -> RepositoryResult<Vec<RawTreeRow>>;

    /// 获取详细树原始行（工单 + 工序 + 物料）
    async fn fetch_detailed_nodes(&self, key: &WorkOrderKey) -> RepositoryResult<Vec<RawTreeRow>>;

    /// 获取层级遍历输入: 工单列表 + (子, 父) 边
    async fn fetch_work_orders_and_edges(
        &self,
        key: &WorkOrderKey,
    ) -> RepositoryResult<(Vec<WorkOrderRow>, Vec<HierarchyEdge>)>;
}

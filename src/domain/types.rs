// ==========================================
// 制造ERP工单树 - 领域类型定义
// ==========================================
// 职责: 节点类型标签、根工单常量
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 根工单的 SUB_ID（顶层工单）
pub const ROOT_SUB_ID: &str = "0";

// ==========================================
// 节点类型 (Node Kind)
// ==========================================
// 序列化格式: WO / OP / MAT (与查询结果一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "WO")]
    WorkOrder, // 工单
    #[serde(rename = "OP")]
    Operation, // 工序
    #[serde(rename = "MAT")]
    Material, // 物料需求
}

impl NodeKind {
    /// 从数据库标签解析
    ///
    /// 未知标签返回 None（由调用方决定丢弃该行）
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "WO" => Some(NodeKind::WorkOrder),
            "OP" => Some(NodeKind::Operation),
            "MAT" => Some(NodeKind::Material),
            _ => None,
        }
    }

    /// 转换为数据库标签
    pub fn to_db_str(&self) -> &'static str {
        match self {
            NodeKind::WorkOrder => "WO",
            NodeKind::Operation => "OP",
            NodeKind::Material => "MAT",
        }
    }

    /// 是否为结构节点（工单/工序）
    ///
    /// 子节点排序时结构节点排在物料之前
    pub fn is_structural(&self) -> bool {
        !matches!(self, NodeKind::Material)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

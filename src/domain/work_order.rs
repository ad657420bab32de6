// ==========================================
// 制造ERP工单树 - 工单节点实体
// ==========================================
// 职责: 定义行源返回的原始行、扁平节点（带类型的和类型）、
//       层级遍历使用的工单行与父子边
// 红线: 展示载荷（零件/数量/日期）对引擎不透明，原样透传
// ==========================================

use crate::domain::types::{NodeKind, ROOT_SUB_ID};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==========================================
// WorkOrderKey - 工单查询键
// ==========================================
/// 一次树查询的根工单键（BASE_ID + LOT_ID，SUB_ID 固定为 "0"）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkOrderKey {
    pub base_id: String,
    pub lot_id: String,
}

impl WorkOrderKey {
    pub fn new(base_id: impl Into<String>, lot_id: impl Into<String>) -> Self {
        Self {
            base_id: base_id.into(),
            lot_id: lot_id.into(),
        }
    }
}

// ==========================================
// RawTreeRow - 递归查询返回的原始行
// ==========================================
/// 行源返回的原始行
///
/// 所有标识字段均为 Option：行源数据质量不可控，
/// 缺失标识的行在转换为 `FlatNode` 时被拒绝。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTreeRow {
    /// 节点类型标签 (WO / OP / MAT)
    pub node_type: Option<String>,

    /// 查询阶段计算的深度（仅作参考，组装后重算）
    pub depth: Option<i32>,

    /// 字典序排序键
    pub sort_key: Option<String>,

    /// 所属工单 SUB_ID
    pub sub_id: Option<String>,

    /// 工序号（OP / MAT）
    pub op_seq: Option<i32>,

    /// 件号（MAT）
    pub piece_no: Option<i32>,

    /// 父工单 SUB_ID（子工单）
    pub parent_sub_id: Option<String>,

    /// 父工单工序号（子工单，仅详细树）
    pub parent_op_seq: Option<i32>,

    // ===== 展示载荷 =====
    pub part_id: Option<String>,
    pub part_description: Option<String>,
    pub qty: Option<f64>,
    pub status: Option<String>,
    pub work_order_type: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub finish_date: Option<NaiveDate>,
    pub close_date: Option<NaiveDate>,
    pub resource_id: Option<String>,
    pub resource_description: Option<String>,
    pub dimensions: Option<String>,
}

// ==========================================
// RowRejection - 行拒绝原因
// ==========================================
/// 原始行无法转换为节点的原因（仅丢弃该行，不中断组装）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowRejection {
    #[error("节点类型缺失: sort_key={sort_key:?}")]
    MissingNodeType { sort_key: Option<String> },

    #[error("未知节点类型: {node_type}")]
    UnknownNodeType { node_type: String },

    #[error("标识字段缺失 (node_type={node_type}, field={field}): sort_key={sort_key:?}")]
    MissingField {
        node_type: NodeKind,
        field: &'static str,
        sort_key: Option<String>,
    },
}

// ==========================================
// FlatNode - 扁平节点
// ==========================================

/// 父级链接：子工单由父工单的某道工序产生
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentLink {
    /// 父工单 SUB_ID
    pub sub_id: String,
    /// 父工单工序号（简化树行不携带）
    pub op_seq: Option<i32>,
}

/// 节点公共头：身份与排序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeHeader {
    pub sub_id: String,
    pub sort_key: String,
    /// 查询阶段的深度提示，组装后被真实深度取代
    #[serde(skip)]
    pub depth_hint: Option<i32>,
    pub status: Option<String>,
}

/// 工单节点载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderNode {
    /// 内部字段，仅用于嵌套，不输出
    #[serde(skip)]
    pub parent: Option<ParentLink>,
    pub part_id: Option<String>,
    pub part_description: Option<String>,
    pub order_qty: f64,
    #[serde(rename = "type")]
    pub work_order_type: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub finish_date: Option<NaiveDate>,
    pub close_date: Option<NaiveDate>,
}

/// 工序节点载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationNode {
    pub op_seq: i32,
    pub resource_id: Option<String>,
    pub resource_description: Option<String>,
}

/// 物料需求节点载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialNode {
    pub op_seq: i32,
    pub piece_no: i32,
    pub part_id: Option<String>,
    pub part_description: Option<String>,
    pub qty: Option<f64>,
    pub dimensions: Option<String>,
}

/// 节点类型相关载荷（闭合和类型）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "nodeType")]
pub enum NodeBody {
    #[serde(rename = "WO")]
    WorkOrder(WorkOrderNode),
    #[serde(rename = "OP")]
    Operation(OperationNode),
    #[serde(rename = "MAT")]
    Material(MaterialNode),
}

/// 扁平节点：公共头 + 类型载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatNode {
    #[serde(flatten)]
    pub header: NodeHeader,
    #[serde(flatten)]
    pub body: NodeBody,
}

impl FlatNode {
    pub fn kind(&self) -> NodeKind {
        match self.body {
            NodeBody::WorkOrder(_) => NodeKind::WorkOrder,
            NodeBody::Operation(_) => NodeKind::Operation,
            NodeBody::Material(_) => NodeKind::Material,
        }
    }

    pub fn sub_id(&self) -> &str {
        &self.header.sub_id
    }

    pub fn sort_key(&self) -> &str {
        &self.header.sort_key
    }

    /// 是否为根工单 (WO, SUB_ID = "0")
    pub fn is_root(&self) -> bool {
        matches!(self.body, NodeBody::WorkOrder(_)) && self.header.sub_id == ROOT_SUB_ID
    }

    /// 工单节点的父级链接（非工单节点返回 None）
    pub fn parent_link(&self) -> Option<&ParentLink> {
        match &self.body {
            NodeBody::WorkOrder(wo) => wo.parent.as_ref(),
            _ => None,
        }
    }

    /// 工序号（工单节点返回 None）
    pub fn op_seq(&self) -> Option<i32> {
        match &self.body {
            NodeBody::WorkOrder(_) => None,
            NodeBody::Operation(op) => Some(op.op_seq),
            NodeBody::Material(mat) => Some(mat.op_seq),
        }
    }
}

/// 规范化标识字段：去除 ERP 定长字段的填充空格，空串视为缺失
fn normalize_id(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TryFrom<RawTreeRow> for FlatNode {
    type Error = RowRejection;

    fn try_from(row: RawTreeRow) -> Result<Self, Self::Error> {
        let kind = match row.node_type.as_deref() {
            None => {
                return Err(RowRejection::MissingNodeType {
                    sort_key: row.sort_key,
                })
            }
            Some(tag) => NodeKind::from_db_str(tag).ok_or_else(|| RowRejection::UnknownNodeType {
                node_type: tag.to_string(),
            })?,
        };

        let missing = |field: &'static str, sort_key: &Option<String>| RowRejection::MissingField {
            node_type: kind,
            field,
            sort_key: sort_key.clone(),
        };

        let sub_id = normalize_id(row.sub_id).ok_or_else(|| missing("sub_id", &row.sort_key))?;
        let sort_key = row
            .sort_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| missing("sort_key", &row.sort_key))?;

        let body = match kind {
            NodeKind::WorkOrder => {
                let parent = normalize_id(row.parent_sub_id).map(|parent_sub_id| ParentLink {
                    sub_id: parent_sub_id,
                    op_seq: row.parent_op_seq,
                });
                NodeBody::WorkOrder(WorkOrderNode {
                    parent,
                    part_id: row.part_id,
                    part_description: row.part_description,
                    order_qty: row.qty.unwrap_or(0.0),
                    work_order_type: row.work_order_type,
                    start_date: row.start_date,
                    finish_date: row.finish_date,
                    close_date: row.close_date,
                })
            }
            NodeKind::Operation => NodeBody::Operation(OperationNode {
                op_seq: row.op_seq.ok_or_else(|| missing("op_seq", &row.sort_key))?,
                resource_id: row.resource_id,
                resource_description: row.resource_description,
            }),
            NodeKind::Material => NodeBody::Material(MaterialNode {
                op_seq: row.op_seq.ok_or_else(|| missing("op_seq", &row.sort_key))?,
                piece_no: row.piece_no.ok_or_else(|| missing("piece_no", &row.sort_key))?,
                part_id: row.part_id,
                part_description: row.part_description,
                qty: row.qty,
                dimensions: row.dimensions,
            }),
        };

        Ok(FlatNode {
            header: NodeHeader {
                sub_id,
                sort_key,
                depth_hint: row.depth,
                status: row.status,
            },
            body,
        })
    }
}

// ==========================================
// 层级遍历输入（父子边形式）
// ==========================================

/// 工单行（层级遍历输入）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderRow {
    pub sub_id: String,
    pub part_id: Option<String>,
    pub part_description: Option<String>,
    pub order_qty: f64,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub work_order_type: Option<String>,
}

impl WorkOrderRow {
    /// 路径中的自描述片段
    ///
    /// SUB_ID 左补零到 3 位（与排序键一致），保证路径字典序即深度优先顺序
    pub fn self_description(&self) -> String {
        let label = format!(
            "[{:0>3}] {}",
            self.sub_id,
            self.part_id.as_deref().unwrap_or("")
        );
        label.trim_end().to_string()
    }
}

/// 父子边：子工单 SUB_ID -> 父工单 SUB_ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyEdge {
    pub child_sub_id: String,
    pub parent_sub_id: String,
}

impl HierarchyEdge {
    pub fn new(child_sub_id: impl Into<String>, parent_sub_id: impl Into<String>) -> Self {
        Self {
            child_sub_id: child_sub_id.into(),
            parent_sub_id: parent_sub_id.into(),
        }
    }
}

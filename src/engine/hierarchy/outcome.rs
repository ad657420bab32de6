use crate::domain::work_order::WorkOrderRow;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// 环检测哨兵深度（仅用于对外 JSON）
pub const CYCLE_SENTINEL_DEPTH: u32 = 999;

/// 环检测哨兵路径
pub const CYCLE_SENTINEL_PATH: &str = "CYCLE_DETECTED";

/// 路径分隔符
pub const PATH_SEPARATOR: &str = " -> ";

// ==========================================
// AscentOutcome - 上溯结果
// ==========================================
/// 单个工单的上溯结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AscentOutcome {
    /// 正常: 真实深度与路径
    Resolved { depth: u32, path: String },
    /// 超过最大深度: 深度已截断为上限
    DepthExceeded { depth: u32, path: String },
    /// 上溯链存在环（自身在环上或祖先在环上）
    Cycle,
}

impl AscentOutcome {
    pub fn depth(&self) -> u32 {
        match self {
            AscentOutcome::Resolved { depth, .. } | AscentOutcome::DepthExceeded { depth, .. } => {
                *depth
            }
            AscentOutcome::Cycle => CYCLE_SENTINEL_DEPTH,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            AscentOutcome::Resolved { path, .. } | AscentOutcome::DepthExceeded { path, .. } => {
                path
            }
            AscentOutcome::Cycle => CYCLE_SENTINEL_PATH,
        }
    }

    pub fn is_cycle(&self) -> bool {
        matches!(self, AscentOutcome::Cycle)
    }

    fn status(&self) -> &'static str {
        match self {
            AscentOutcome::Resolved { .. } => "RESOLVED",
            AscentOutcome::DepthExceeded { .. } => "DEPTH_EXCEEDED",
            AscentOutcome::Cycle => "CYCLE",
        }
    }
}

// ==========================================
// HierarchyEntry - 层级条目
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyEntry {
    pub work_order: WorkOrderRow,
    pub outcome: AscentOutcome,
}

impl HierarchyEntry {
    pub fn sub_id(&self) -> &str {
        &self.work_order.sub_id
    }

    pub fn depth(&self) -> u32 {
        self.outcome.depth()
    }

    pub fn path(&self) -> &str {
        self.outcome.path()
    }
}

// JSON: { workOrder, depth, path, status },环节点输出哨兵值
impl Serialize for HierarchyEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("HierarchyEntry", 4)?;
        state.serialize_field("workOrder", &self.work_order)?;
        state.serialize_field("depth", &self.depth())?;
        state.serialize_field("path", self.path())?;
        state.serialize_field("status", self.outcome.status())?;
        state.end()
    }
}

// ==========================================
// HierarchyDiagnostic - 诊断信息
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    /// 节点在环上; chain 为环上节点（按上溯顺序）
    Cycle { chain: Vec<String> },
    /// 祖先在环上
    CyclicAncestor { ancestor_sub_id: String },
    /// 深度超过上限
    DepthExceeded { max_depth: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyDiagnostic {
    pub sub_id: String,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

// ==========================================
// HierarchyReport - 层级计算报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HierarchyReport {
    /// 按路径字典序排序
    pub entries: Vec<HierarchyEntry>,
    pub diagnostics: Vec<HierarchyDiagnostic>,
}

impl HierarchyReport {
    pub fn entry(&self, sub_id: &str) -> Option<&HierarchyEntry> {
        self.entries.iter().find(|e| e.sub_id() == sub_id)
    }

    pub fn has_cycles(&self) -> bool {
        self.entries.iter().any(|e| e.outcome.is_cycle())
    }
}

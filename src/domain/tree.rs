// ==========================================
// 制造ERP工单树 - 树结构输出
// ==========================================
// 职责: 定义组装后的树节点、详细树汇总
// ==========================================

use crate::domain::types::NodeKind;
use crate::domain::work_order::FlatNode;
use serde::{Deserialize, Serialize};

// ==========================================
// TreeNode - 树节点
// ==========================================
/// 组装后的树节点
///
/// - depth: 真实结构深度（根为 0），由深度重算覆盖
/// - children: 有序子节点，顺序即展示顺序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub depth: u32,
    #[serde(flatten)]
    pub node: FlatNode,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// 由扁平节点创建叶子（深度暂取查询提示值）
    pub fn leaf(node: FlatNode) -> Self {
        let depth = node
            .header
            .depth_hint
            .and_then(|d| u32::try_from(d).ok())
            .unwrap_or(0);
        Self {
            depth,
            node,
            children: Vec::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.node.kind()
    }

    /// 先序遍历（含自身）
    pub fn pre_order(&self) -> Vec<&TreeNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            for child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// 子树节点总数（含自身）
    pub fn node_count(&self) -> usize {
        self.pre_order().len()
    }
}

// ==========================================
// DetailedTreeSummary - 详细树汇总
// ==========================================
/// 详细树汇总（嵌套前统计）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedTreeSummary {
    pub work_orders: usize,
    pub operations: usize,
    pub materials: usize,
    pub total_nodes: usize,
    /// 因父节点缺失或不可达而未进入树的节点数
    pub dropped_nodes: usize,
}

/// 详细树结果；空输入时 tree 与 summary 均为 None
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetailedTree {
    pub tree: Option<TreeNode>,
    pub summary: Option<DetailedTreeSummary>,
}

/// 简化树结果（仅工单）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifiedTree {
    pub tree: Option<TreeNode>,
    pub total_work_orders: usize,
}

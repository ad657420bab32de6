// ==========================================
// 制造ERP工单树 - 树组装引擎
// ==========================================
// 职责: 将扁平节点挂接到唯一父节点,生成单根树
// 输入: 扁平节点列表（工单 / 工序 / 物料）
// 输出: 有序嵌套树 + 汇总
// ==========================================
// 详细树挂接规则:
//   根工单       → 子节点: 自身工序
//   工序         → 子节点: 子工单标签、子工单的工序、物料
//   子工单标签   → 无子节点（其工序被提升到父工序之下）
//   物料         → 叶子
// 身份重复的节点（同 SUB_ID 工单 / 同工序 / 同件号物料）只保留排序键最小者
// 红线: 父节点缺失时丢弃该节点,不中断整棵树的组装
// ==========================================

use crate::domain::tree::{DetailedTree, DetailedTreeSummary, SimplifiedTree, TreeNode};
use crate::domain::types::{NodeKind, ROOT_SUB_ID};
use crate::domain::work_order::{FlatNode, NodeBody, RawTreeRow};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::depth::recalculate_depths;
use super::index::TreeIndex;
use super::ordering::order_children;

// ==========================================
// 挂接结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attachment {
    /// 根节点
    Root,
    /// 挂到 arena 中的父节点
    Parent(usize),
    /// 父节点缺失（附原因）
    Dangling(&'static str),
}

// ==========================================
// Arena - 节点仓 + 显式父子边
// ==========================================
struct Arena {
    slots: Vec<Option<FlatNode>>,
    children: Vec<Vec<usize>>,
}

impl Arena {
    fn new(nodes: Vec<FlatNode>) -> Self {
        let len = nodes.len();
        Self {
            slots: nodes.into_iter().map(Some).collect(),
            children: vec![Vec::new(); len],
        }
    }

    fn attach(&mut self, parent: usize, child: usize) {
        self.children[parent].push(child);
    }

    /// 从根节点取出子树
    ///
    /// 每个节点只有一个父节点,根可达部分必为树;
    /// 根不可达的环不会被访问
    fn materialize(&mut self, idx: usize) -> Option<TreeNode> {
        let node = self.slots[idx].take()?;
        let mut tree_node = TreeNode::leaf(node);
        let child_ids = std::mem::take(&mut self.children[idx]);
        for child_idx in child_ids {
            if let Some(child) = self.materialize(child_idx) {
                tree_node.children.push(child);
            }
        }
        Some(tree_node)
    }
}

// ==========================================
// WorkOrderTreeBuilder - 树组装引擎
// ==========================================
// 无状态引擎,一次请求一棵树
pub struct WorkOrderTreeBuilder {
    // 无状态
}

impl Default for WorkOrderTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkOrderTreeBuilder {
    /// 创建新的树组装引擎
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 原始行入口
    // ==========================================

    /// 原始行 → 扁平节点
    ///
    /// 标识字段缺失的行被排除（记录告警）,与悬空引用同等处理
    pub fn convert_rows(&self, rows: Vec<RawTreeRow>) -> Vec<FlatNode> {
        let total = rows.len();
        let mut nodes = Vec::with_capacity(total);

        for row in rows {
            match FlatNode::try_from(row) {
                Ok(node) => nodes.push(node),
                Err(reason) => warn!(reason = %reason, "原始行标识字段不完整,已排除"),
            }
        }

        if nodes.len() < total {
            warn!(
                total_rows = total,
                accepted = nodes.len(),
                rejected = total - nodes.len(),
                "部分原始行被排除"
            );
        }

        nodes
    }

    /// 由原始行构建简化树
    pub fn build_simplified_from_rows(&self, rows: Vec<RawTreeRow>) -> SimplifiedTree {
        let nodes = self.convert_rows(rows);
        let total_work_orders = nodes
            .iter()
            .filter(|n| n.kind() == NodeKind::WorkOrder)
            .count();

        SimplifiedTree {
            tree: self.build_simplified(nodes),
            total_work_orders,
        }
    }

    /// 由原始行构建详细树
    pub fn build_detailed_from_rows(&self, rows: Vec<RawTreeRow>) -> DetailedTree {
        let nodes = self.convert_rows(rows);
        self.build_detailed(nodes)
    }

    // ==========================================
    // 简化树
    // ==========================================

    /// 构建简化树（仅工单,按父工单 SUB_ID 嵌套）
    ///
    /// # 返回
    /// - None: 输入为空或缺少根工单
    pub fn build_simplified(&self, nodes: Vec<FlatNode>) -> Option<TreeNode> {
        if nodes.is_empty() {
            debug!("简化树输入为空");
            return None;
        }

        let nodes = sort_by_key(nodes);
        let total = nodes.len();
        debug!(nodes = total, "开始组装简化树");

        let index = TreeIndex::build(&nodes);
        let Some(root_idx) = index.work_order(ROOT_SUB_ID) else {
            warn!(nodes = total, "简化树缺少根工单 (SUB_ID=0)");
            return None;
        };

        let attachments: Vec<Attachment> = nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| simplified_attachment(&index, root_idx, idx, node))
            .collect();

        let mut root = assemble(nodes, &attachments, root_idx)?;
        recalculate_depths(&mut root);

        let attached = root.node_count();
        if attached < total {
            warn!(
                total_nodes = total,
                attached = attached,
                dropped = total - attached,
                "简化树存在无法挂接的节点,已丢弃"
            );
        }
        info!(attached = attached, "简化树组装完成");

        Some(root)
    }

    // ==========================================
    // 详细树
    // ==========================================

    /// 构建详细树（工单 + 工序 + 物料）
    ///
    /// # 返回
    /// - tree/summary 均为 None: 输入为空
    /// - tree 为 None、summary 存在: 缺少根工单
    pub fn build_detailed(&self, nodes: Vec<FlatNode>) -> DetailedTree {
        if nodes.is_empty() {
            debug!("详细树输入为空");
            return DetailedTree::default();
        }

        let nodes = sort_by_key(nodes);
        let mut summary = summarize(&nodes);
        debug!(
            work_orders = summary.work_orders,
            operations = summary.operations,
            materials = summary.materials,
            "开始组装详细树"
        );

        let index = TreeIndex::build(&nodes);
        let Some(root_idx) = index.work_order(ROOT_SUB_ID) else {
            warn!(total_nodes = summary.total_nodes, "详细树缺少根工单 (SUB_ID=0)");
            summary.dropped_nodes = summary.total_nodes;
            return DetailedTree {
                tree: None,
                summary: Some(summary),
            };
        };

        let mut seen_materials: HashSet<(&str, i32, i32)> = HashSet::new();
        let attachments: Vec<Attachment> = nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| {
                detailed_attachment(&index, &nodes, root_idx, idx, node, &mut seen_materials)
            })
            .collect();

        let Some(mut root) = assemble(nodes, &attachments, root_idx) else {
            summary.dropped_nodes = summary.total_nodes;
            return DetailedTree {
                tree: None,
                summary: Some(summary),
            };
        };

        order_children(&mut root);
        recalculate_depths(&mut root);

        let attached = root.node_count();
        summary.dropped_nodes = summary.total_nodes - attached;
        if summary.dropped_nodes > 0 {
            warn!(
                total_nodes = summary.total_nodes,
                attached = attached,
                dropped = summary.dropped_nodes,
                "详细树存在无法挂接的节点,已丢弃"
            );
        }
        info!(
            attached = attached,
            work_orders = summary.work_orders,
            operations = summary.operations,
            materials = summary.materials,
            "详细树组装完成"
        );

        DetailedTree {
            tree: Some(root),
            summary: Some(summary),
        }
    }
}

// ==========================================
// 内部辅助函数
// ==========================================

/// 按排序键稳定排序,使 arena 顺序等于遍历顺序
fn sort_by_key(mut nodes: Vec<FlatNode>) -> Vec<FlatNode> {
    nodes.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
    nodes
}

/// 嵌套前统计
fn summarize(nodes: &[FlatNode]) -> DetailedTreeSummary {
    let mut summary = DetailedTreeSummary {
        work_orders: 0,
        operations: 0,
        materials: 0,
        total_nodes: nodes.len(),
        dropped_nodes: 0,
    };
    for node in nodes {
        match node.kind() {
            NodeKind::WorkOrder => summary.work_orders += 1,
            NodeKind::Operation => summary.operations += 1,
            NodeKind::Material => summary.materials += 1,
        }
    }
    summary
}

/// 按挂接结果连边并从根取出树
fn assemble(nodes: Vec<FlatNode>, attachments: &[Attachment], root_idx: usize) -> Option<TreeNode> {
    let mut arena = Arena::new(nodes);

    for (idx, attachment) in attachments.iter().enumerate() {
        match attachment {
            Attachment::Root => {}
            Attachment::Parent(parent) => arena.attach(*parent, idx),
            Attachment::Dangling(reason) => {
                if let Some(node) = arena.slots[idx].as_ref() {
                    warn!(
                        node_type = %node.kind(),
                        sub_id = %node.sub_id(),
                        op_seq = ?node.op_seq(),
                        sort_key = %node.sort_key(),
                        reason = *reason,
                        "节点无法挂接,已丢弃"
                    );
                }
            }
        }
    }

    arena.materialize(root_idx)
}

/// 简化树挂接: 工单挂到父工单 SUB_ID 下
fn simplified_attachment(
    index: &TreeIndex,
    root_idx: usize,
    idx: usize,
    node: &FlatNode,
) -> Attachment {
    if idx == root_idx {
        return Attachment::Root;
    }

    match &node.body {
        NodeBody::WorkOrder(wo) => {
            if node.is_root() {
                return Attachment::Dangling("根工单重复");
            }
            if index.work_order(node.sub_id()) != Some(idx) {
                return Attachment::Dangling("身份重复");
            }
            match &wo.parent {
                None => Attachment::Dangling("非根工单缺少父工单"),
                Some(link) => index
                    .work_order(&link.sub_id)
                    .map(Attachment::Parent)
                    .unwrap_or(Attachment::Dangling("父工单不存在")),
            }
        }
        _ => Attachment::Dangling("简化树仅接受工单节点"),
    }
}

/// 详细树挂接（按节点类型分派）
fn detailed_attachment<'a>(
    index: &TreeIndex,
    nodes: &[FlatNode],
    root_idx: usize,
    idx: usize,
    node: &'a FlatNode,
    seen_materials: &mut HashSet<(&'a str, i32, i32)>,
) -> Attachment {
    if idx == root_idx {
        return Attachment::Root;
    }

    match &node.body {
        // 子工单标签 → 父工序
        NodeBody::WorkOrder(wo) => {
            if node.is_root() {
                return Attachment::Dangling("根工单重复");
            }
            if index.work_order(node.sub_id()) != Some(idx) {
                return Attachment::Dangling("身份重复");
            }
            match &wo.parent {
                None => Attachment::Dangling("非根工单缺少父级链接"),
                Some(link) => match link.op_seq {
                    None => Attachment::Dangling("父级链接缺少工序号"),
                    Some(op_seq) => index
                        .operation(&link.sub_id, op_seq)
                        .map(Attachment::Parent)
                        .unwrap_or(Attachment::Dangling("父工序不存在")),
                },
            }
        }

        // 工序 → 根工单,或（子工单的工序）提升到父工序
        NodeBody::Operation(op) => {
            if index.operation(node.sub_id(), op.op_seq) != Some(idx) {
                return Attachment::Dangling("身份重复");
            }
            let Some(owner_idx) = index.work_order(node.sub_id()) else {
                return Attachment::Dangling("所属工单不存在");
            };
            let owner = &nodes[owner_idx];
            if owner.is_root() {
                return Attachment::Parent(root_idx);
            }
            match owner.parent_link() {
                None => Attachment::Dangling("所属工单缺少父级链接"),
                Some(link) => match link.op_seq {
                    None => Attachment::Dangling("所属工单父级链接缺少工序号"),
                    Some(op_seq) => index
                        .operation(&link.sub_id, op_seq)
                        .map(Attachment::Parent)
                        .unwrap_or(Attachment::Dangling("所属工单的父工序不存在")),
                },
            }
        }

        // 物料 → 同工单同工序号的工序
        NodeBody::Material(mat) => {
            if !seen_materials.insert((node.sub_id(), mat.op_seq, mat.piece_no)) {
                return Attachment::Dangling("身份重复");
            }
            index
                .operation(node.sub_id(), mat.op_seq)
                .map(Attachment::Parent)
                .unwrap_or(Attachment::Dangling("所属工序不存在"))
        }
    }
}

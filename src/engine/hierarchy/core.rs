// ==========================================
// 制造ERP工单树 - 层级遍历引擎
// ==========================================
// 输入: 工单列表 + (子, 父) 边,无预计算排序键
// 输出: 每个工单的深度与路径,按路径字典序排序
// ==========================================
// 规则:
//   - 根工单 (SUB_ID=0) 预置: 深度 0,路径 = 自描述
//   - 无父记录的非根工单: 深度 1,路径 = 根路径 -> 自描述
//   - 其余: 深度 = 父深度 + 1,路径 = 父路径 -> 自描述
// 红线: 环与超深节点保留在输出中（哨兵结果 + 诊断）,不丢弃
// ==========================================

use crate::domain::types::ROOT_SUB_ID;
use crate::domain::work_order::{HierarchyEdge, WorkOrderRow};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use super::outcome::{
    AscentOutcome, DiagnosticKind, HierarchyDiagnostic, HierarchyEntry, HierarchyReport,
    PATH_SEPARATOR,
};

/// 默认最大深度
pub const DEFAULT_MAX_DEPTH: u32 = 50;

// ==========================================
// HierarchyWalker - 层级遍历引擎
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct HierarchyWalker {
    max_depth: u32,
}

impl Default for HierarchyWalker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl HierarchyWalker {
    /// 创建层级遍历引擎
    ///
    /// # 参数
    /// - `max_depth`: 最大深度（至少为 1）
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth: max_depth.max(1),
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// 计算所有工单的深度与路径
    pub fn compute(&self, work_orders: &[WorkOrderRow], edges: &[HierarchyEdge]) -> HierarchyReport {
        debug!(
            work_orders = work_orders.len(),
            edges = edges.len(),
            max_depth = self.max_depth,
            "开始计算工单层级"
        );

        if work_orders.is_empty() {
            return HierarchyReport::default();
        }

        let mut ascent = Ascent::new(self.max_depth, work_orders, edges);
        let mut entries: Vec<HierarchyEntry> = work_orders
            .iter()
            .map(|row| HierarchyEntry {
                work_order: row.clone(),
                outcome: ascent.resolve(&row.sub_id),
            })
            .collect();

        entries.sort_by(|a, b| {
            a.path()
                .cmp(b.path())
                .then_with(|| a.sub_id().cmp(b.sub_id()))
        });

        let diagnostics = ascent.diagnostics;
        let cycles = entries.iter().filter(|e| e.outcome.is_cycle()).count();
        info!(
            entries = entries.len(),
            cycles = cycles,
            diagnostics = diagnostics.len(),
            "工单层级计算完成"
        );

        HierarchyReport {
            entries,
            diagnostics,
        }
    }
}

// ==========================================
// Ascent - 单次请求的上溯状态（备忘表 + 诊断）
// ==========================================
struct Ascent<'a> {
    max_depth: u32,
    rows: HashMap<&'a str, &'a WorkOrderRow>,
    parents: HashMap<&'a str, &'a str>,
    root_path: Option<String>,
    memo: HashMap<&'a str, AscentOutcome>,
    diagnostics: Vec<HierarchyDiagnostic>,
}

impl<'a> Ascent<'a> {
    fn new(max_depth: u32, work_orders: &'a [WorkOrderRow], edges: &'a [HierarchyEdge]) -> Self {
        let mut rows: HashMap<&'a str, &'a WorkOrderRow> = HashMap::new();
        for row in work_orders {
            if rows.contains_key(row.sub_id.as_str()) {
                warn!(sub_id = %row.sub_id, "工单重复,保留首条记录");
                continue;
            }
            rows.insert(row.sub_id.as_str(), row);
        }

        let mut parents: HashMap<&'a str, &'a str> = HashMap::new();
        for edge in edges {
            let child = edge.child_sub_id.as_str();
            let parent = edge.parent_sub_id.as_str();
            if let Some(existing) = parents.get(child) {
                if *existing != parent {
                    warn!(
                        child_sub_id = %child,
                        kept_parent = %existing,
                        ignored_parent = %parent,
                        "工单存在多个父工单,保留首条边"
                    );
                }
                continue;
            }
            if !rows.contains_key(parent) {
                warn!(
                    child_sub_id = %child,
                    parent_sub_id = %parent,
                    "父工单不在工单列表中,按无父工单处理"
                );
                continue;
            }
            parents.insert(child, parent);
        }

        let mut memo: HashMap<&'a str, AscentOutcome> = HashMap::new();
        let root_path = rows.get(ROOT_SUB_ID).map(|root| {
            let path = root.self_description();
            memo.insert(
                ROOT_SUB_ID,
                AscentOutcome::Resolved {
                    depth: 0,
                    path: path.clone(),
                },
            );
            path
        });

        Self {
            max_depth,
            rows,
            parents,
            root_path,
            memo,
            diagnostics: Vec::new(),
        }
    }

    fn description(&self, sub_id: &str) -> String {
        self.rows
            .get(sub_id)
            .map(|row| row.self_description())
            .unwrap_or_else(|| format!("[{:0>3}]", sub_id))
    }

    /// 上溯求解（显式循环,不递归）
    ///
    /// 沿父链向上直到命中备忘表、无父节点或回到本次链上的节点,
    /// 再沿链反向逐个计算并写入备忘表
    fn resolve(&mut self, start: &'a str) -> AscentOutcome {
        if let Some(done) = self.memo.get(start) {
            return done.clone();
        }

        let mut chain: Vec<&'a str> = Vec::new();
        let mut on_chain: HashSet<&'a str> = HashSet::new();
        let mut current = start;

        // (基准结果, 基准节点)
        let (mut parent_outcome, mut parent_id) = loop {
            if let Some(done) = self.memo.get(current) {
                break (done.clone(), current);
            }

            if on_chain.contains(current) {
                let pos = chain.iter().position(|id| *id == current).unwrap_or(0);
                let members: Vec<&'a str> = chain.split_off(pos);
                self.mark_cycle(&members);
                break (AscentOutcome::Cycle, current);
            }

            on_chain.insert(current);
            chain.push(current);

            match self.parents.get(current).copied() {
                Some(parent) => current = parent,
                None => {
                    let outcome = self.orphan_outcome(current);
                    self.memo.insert(current, outcome.clone());
                    chain.pop();
                    break (outcome, current);
                }
            }
        };

        while let Some(node) = chain.pop() {
            let outcome = self.extend(&parent_outcome, parent_id, node);
            self.memo.insert(node, outcome.clone());
            parent_outcome = outcome;
            parent_id = node;
        }

        self.memo
            .get(start)
            .cloned()
            .unwrap_or(AscentOutcome::Cycle)
    }

    /// 无父记录的工单: 视为根的直接下级
    fn orphan_outcome(&mut self, sub_id: &'a str) -> AscentOutcome {
        let own = self.description(sub_id);
        let path = match &self.root_path {
            Some(root_path) => format!("{}{}{}", root_path, PATH_SEPARATOR, own),
            None => own,
        };
        self.bounded(sub_id, 1, path)
    }

    /// 由父结果推导子结果
    fn extend(&mut self, parent: &AscentOutcome, parent_id: &str, sub_id: &'a str) -> AscentOutcome {
        match parent {
            AscentOutcome::Cycle => {
                warn!(
                    sub_id = %sub_id,
                    ancestor_sub_id = %parent_id,
                    "工单祖先链存在环"
                );
                self.diagnostics.push(HierarchyDiagnostic {
                    sub_id: sub_id.to_string(),
                    kind: DiagnosticKind::CyclicAncestor {
                        ancestor_sub_id: parent_id.to_string(),
                    },
                });
                AscentOutcome::Cycle
            }
            AscentOutcome::Resolved { depth, path } | AscentOutcome::DepthExceeded { depth, path } => {
                let path = format!("{}{}{}", path, PATH_SEPARATOR, self.description(sub_id));
                self.bounded(sub_id, depth.saturating_add(1), path)
            }
        }
    }

    /// 深度上限检查
    fn bounded(&mut self, sub_id: &'a str, depth: u32, path: String) -> AscentOutcome {
        if depth <= self.max_depth {
            return AscentOutcome::Resolved { depth, path };
        }

        warn!(
            sub_id = %sub_id,
            depth = depth,
            max_depth = self.max_depth,
            "工单层级超过最大深度,已截断"
        );
        self.diagnostics.push(HierarchyDiagnostic {
            sub_id: sub_id.to_string(),
            kind: DiagnosticKind::DepthExceeded {
                max_depth: self.max_depth,
            },
        });
        AscentOutcome::DepthExceeded {
            depth: self.max_depth,
            path,
        }
    }

    /// 环上节点全部标记为 Cycle
    fn mark_cycle(&mut self, members: &[&'a str]) {
        let chain: Vec<String> = members.iter().map(|id| id.to_string()).collect();
        warn!(chain = ?chain, "检测到工单层级环");

        for member in members {
            self.memo.insert(*member, AscentOutcome::Cycle);
            self.diagnostics.push(HierarchyDiagnostic {
                sub_id: member.to_string(),
                kind: DiagnosticKind::Cycle {
                    chain: chain.clone(),
                },
            });
        }
    }
}

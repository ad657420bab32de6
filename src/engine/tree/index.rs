// ==========================================
// 制造ERP工单树 - 节点索引
// ==========================================
// 职责: 按自然身份建立查找表
//   - 工单: SUB_ID
//   - 工序: (SUB_ID, 工序号)
// 索引值为节点在 arena 中的下标
// ==========================================

use crate::domain::work_order::{FlatNode, NodeBody};
use std::collections::HashMap;
use tracing::warn;

/// 工序身份 (SUB_ID, 工序号)
pub type OperationKey = (String, i32);

// ==========================================
// TreeIndex - 节点索引
// ==========================================
#[derive(Debug, Default)]
pub struct TreeIndex {
    work_orders: HashMap<String, usize>,
    operations: HashMap<OperationKey, usize>,
}

impl TreeIndex {
    /// 从 arena 顺序的节点列表建立索引
    ///
    /// 身份重复时保留首个节点（排序键最小者），重复项记录告警
    pub fn build(nodes: &[FlatNode]) -> Self {
        let mut index = TreeIndex::default();

        for (idx, node) in nodes.iter().enumerate() {
            match &node.body {
                NodeBody::WorkOrder(_) => {
                    if let Some(first) = index.work_orders.get(node.sub_id()) {
                        warn!(
                            sub_id = %node.sub_id(),
                            first_sort_key = %nodes[*first].sort_key(),
                            duplicate_sort_key = %node.sort_key(),
                            "工单身份重复,保留首个节点"
                        );
                        continue;
                    }
                    index.work_orders.insert(node.sub_id().to_string(), idx);
                }
                NodeBody::Operation(op) => {
                    let key = (node.sub_id().to_string(), op.op_seq);
                    if index.operations.contains_key(&key) {
                        warn!(
                            sub_id = %node.sub_id(),
                            op_seq = op.op_seq,
                            duplicate_sort_key = %node.sort_key(),
                            "工序身份重复,保留首个节点"
                        );
                        continue;
                    }
                    index.operations.insert(key, idx);
                }
                NodeBody::Material(_) => {}
            }
        }

        index
    }

    /// 按 SUB_ID 查找工单
    pub fn work_order(&self, sub_id: &str) -> Option<usize> {
        self.work_orders.get(sub_id).copied()
    }

    /// 按 (SUB_ID, 工序号) 查找工序
    pub fn operation(&self, sub_id: &str, op_seq: i32) -> Option<usize> {
        self.operations.get(&(sub_id.to_string(), op_seq)).copied()
    }

    pub fn work_order_count(&self) -> usize {
        self.work_orders.len()
    }

    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.work_orders.is_empty() && self.operations.is_empty()
    }
}

// ==========================================
// 制造ERP工单树 - 深度重算
// ==========================================
// 查询阶段的 depth 只是提示值: 子工单工序被提升到父工序之下,
// 实际嵌套深度只有组装完成后才能确定
// ==========================================

use crate::domain::tree::TreeNode;

/// 先序重算深度: 根为 0, 子节点 = 父节点 + 1
pub fn recalculate_depths(root: &mut TreeNode) {
    let mut stack: Vec<(&mut TreeNode, u32)> = vec![(root, 0)];

    while let Some((node, depth)) = stack.pop() {
        node.depth = depth;
        for child in node.children.iter_mut() {
            stack.push((child, depth + 1));
        }
    }
}

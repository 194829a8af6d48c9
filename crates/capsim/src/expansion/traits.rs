use std::{
    fmt::Debug,
    hash::Hash,
    sync::Arc
};

use anyhow::{Result, bail};

use super::ExpansionContext;

// AllocationState 为搜索引擎看到的唯一接口
// 三种变体只在动作空间和深度上不同，奖励的计算方式相同

/// 部分分配状态
///
/// 状态是不可变值：`transition` 总是产生新的状态。
/// `key` 相同的两个状态在搜索树中是同一个节点，不论从哪个父节点到达。
pub trait AllocationState: Clone + Debug {
    /// 一步分配动作
    type Action: Clone + Debug + PartialEq;
    /// 规范化历史，用于节点去重
    type Key: Clone + Debug + Eq + Hash;

    /// 共享上下文
    fn context(&self) -> &Arc<ExpansionContext>;
    /// 当前深度（已执行的动作数）
    fn depth(&self) -> usize;
    /// 变体的固定深度
    fn max_depth(&self) -> usize;
    /// 所有可行的下一步，顺序固定；终局时为空
    fn legal_actions(&self) -> Vec<Self::Action>;
    /// 执行动作得到子状态
    fn transition(&self, action: &Self::Action) -> Self;
    /// 规范化的 (深度, 历史)
    fn key(&self) -> Self::Key;
    /// 应用全部已记录增量后的容量
    fn final_capacities(&self) -> Vec<u32>;

    /// provided: 是否终局
    fn is_terminal(&self) -> bool {
        self.depth() == self.max_depth()
    }

    /// provided: 终局奖励 (基准代价 - 最终代价) / 基准代价
    fn reward(&self) -> Result<f64> {
        if !self.is_terminal() {
            bail!("reward requested on non-terminal state: {:?}", self.key());
        }
        self.context().reward_for(&self.final_capacities())
    }

    /// provided: 每个学校获得的追加容量
    fn allocation(&self) -> Vec<u32> {
        self.final_capacities()
            .iter()
            .zip(self.context().base_capacities())
            .map(|(x, base)| x - base)
            .collect()
    }
}

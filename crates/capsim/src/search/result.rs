//! 搜索结果
//!
//! 定义每次 rollout 的记录和一次搜索的输出。

use serde::{Deserialize, Serialize};

use crate::expansion::AllocationState;

/// 单次 rollout 后的记录
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RolloutRecord {
    /// 到目前为止的最好奖励
    pub reward: f64,
    /// 从搜索开始经过的秒数
    pub run_time: f64
}

/// 一次搜索的输出
#[derive(Debug, Clone)]
pub struct SearchOutcome<S: AllocationState> {
    /// 找到的最好终局
    pub best_state: S,
    /// 最好终局的奖励
    pub best_reward: f64,
    /// 每次 rollout 的记录，按时间顺序
    pub records: Vec<RolloutRecord>,
    /// 实际执行的 rollout 数
    pub rollouts: usize,
    /// 搜索图的节点数
    pub nodes: usize,
    /// 根节点是否已完全枚举
    pub fully_explored: bool,
    /// 总耗时（秒）
    pub run_time: f64
}

impl<S: AllocationState> SearchOutcome<S> {
    /// 最好终局的追加容量
    pub fn allocation(&self) -> Vec<u32> {
        self.best_state.allocation()
    }

    /// 最好终局的最终容量
    pub fn final_capacities(&self) -> Vec<u32> {
        self.best_state.final_capacities()
    }
}

//! 搜索节点
//!
//! 节点存放在引擎的 arena 里，父子关系都用下标表示。
//! 一个节点可以有多个父节点（不同顺序到达同一规范化历史）。

use crate::expansion::AllocationState;

/// 搜索图中的节点
#[derive(Debug, Clone)]
pub struct SearchNode<S: AllocationState> {
    /// 该节点代表的状态
    pub state: S,
    /// 访问次数，AMAF 传播会按重数累加，所以用浮点
    pub visits: f64,
    /// 奖励之和
    pub reward_sum: f64,
    /// 子树是否已经完全枚举
    pub fully_explored: bool,
    /// 完全枚举后子树的最大奖励
    pub best_reward: Option<f64>,
    /// 子节点下标，None 表示尚未展开；顺序与合法动作一致
    pub children: Option<Vec<usize>>,
    /// 父节点下标，不重复
    pub parents: Vec<usize>
}

impl<S: AllocationState> SearchNode<S> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            visits: 0.0,
            reward_sum: 0.0,
            fully_explored: false,
            best_reward: None,
            children: None,
            parents: Vec::new()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn is_expanded(&self) -> bool {
        self.children.is_some()
    }

    /// 平均奖励
    #[inline]
    pub fn mean(&self) -> f64 {
        if self.visits == 0.0 {
            0.0
        } else {
            self.reward_sum / self.visits
        }
    }

    /// UCB 分数；完全枚举的节点不再参与选择
    #[inline]
    pub fn ucb(&self, exploration_weight: f64, ln_parent_visits: f64) -> f64 {
        if self.fully_explored {
            return f64::NEG_INFINITY;
        }
        self.mean() + exploration_weight * (ln_parent_visits / self.visits).sqrt()
    }

    /// 最终决策用的分数
    #[inline]
    pub fn decision_score(&self) -> f64 {
        match (self.fully_explored, self.best_reward) {
            (true, Some(best)) => best,
            _ if self.visits == 0.0 => f64::NEG_INFINITY,
            _ => self.mean()
        }
    }

    pub fn add_parent(&mut self, parent: usize) {
        if !self.parents.contains(&parent) {
            self.parents.push(parent);
        }
    }
}

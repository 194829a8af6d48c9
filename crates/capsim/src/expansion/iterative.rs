//! 逐个分配：每一步把一个单位交给某个学校，深度等于总预算
//!
//! 分配顺序不影响最终容量，所以规范化历史是排序后的多重集合，
//! 不同顺序到达的同一组合共享一个节点。

use std::sync::Arc;

use anyhow::{Result, bail};

use super::{AllocationState, ExpansionContext};

#[derive(Debug, Clone)]
pub struct IterativeState {
    context: Arc<ExpansionContext>,
    /// 按时间顺序获得单位的学校
    history: Vec<usize>,
    /// counts[j] = history 中 j 出现的次数
    counts: Vec<u32>
}

impl IterativeState {
    /// 根状态，总预算无法分完时报错
    pub fn new(context: Arc<ExpansionContext>) -> Result<Self> {
        if !context.instance().is_budget_feasible() {
            bail!(
                "总预算 {} 超过学校预算之和 {:?}，不存在可行分配",
                context.budget(),
                context.college_budgets()
            );
        }
        let counts = vec![0; context.num_colleges()];
        Ok(Self { context, history: Vec::new(), counts })
    }

    pub fn history(&self) -> &[usize] {
        &self.history
    }

    /// 剩余可分配给各学校的单位之和
    fn remaining_caps(&self) -> u64 {
        self.context
            .college_budgets()
            .iter()
            .zip(&self.counts)
            .map(|(cap, used)| (cap - used) as u64)
            .sum()
    }
}

impl AllocationState for IterativeState {
    type Action = usize;
    type Key = (usize, Vec<usize>);

    fn context(&self) -> &Arc<ExpansionContext> {
        &self.context
    }

    fn depth(&self) -> usize {
        self.history.len()
    }

    fn max_depth(&self) -> usize {
        self.context.budget() as usize
    }

    fn legal_actions(&self) -> Vec<usize> {
        if self.is_terminal() {
            return Vec::new();
        }
        let left_after = (self.max_depth() - self.depth() - 1) as u64;
        let slack_after = self.remaining_caps().saturating_sub(1);
        if slack_after < left_after {
            return Vec::new();
        }
        self.context
            .college_budgets()
            .iter()
            .enumerate()
            .filter(|(j, cap)| self.counts[*j] < **cap)
            .map(|(j, _)| j)
            .collect()
    }

    fn transition(&self, action: &usize) -> Self {
        let mut next = self.clone();
        next.history.push(*action);
        next.counts[*action] += 1;
        next
    }

    fn key(&self) -> Self::Key {
        let mut sorted = self.history.clone();
        sorted.sort_unstable();
        (self.depth(), sorted)
    }

    fn final_capacities(&self) -> Vec<u32> {
        self.context
            .base_capacities()
            .iter()
            .zip(&self.counts)
            .map(|(base, extra)| base + extra)
            .collect()
    }
}

//! 批量分配：每一轮给出一个增量向量，轮数等于学校数
//!
//! 轮次之间可以交换，规范化历史是排序后的轮次向量列表。
//! 每轮的增量只受各学校剩余预算和剩余总预算限制，最后一轮必须分完。

use std::sync::Arc;

use anyhow::{Result, bail};

use super::{AllocationState, ExpansionContext};
use crate::utils::bounded_compositions;

#[derive(Debug, Clone)]
pub struct BatchState {
    context: Arc<ExpansionContext>,
    /// 每一轮的增量向量，按学校下标
    rounds: Vec<Vec<u32>>,
    /// 各学校累计获得的单位
    given: Vec<u32>
}

impl BatchState {
    /// 根状态，总预算无法分完时报错
    pub fn new(context: Arc<ExpansionContext>) -> Result<Self> {
        if !context.instance().is_budget_feasible() {
            bail!(
                "总预算 {} 超过学校预算之和 {:?}，不存在可行分配",
                context.budget(),
                context.college_budgets()
            );
        }
        let given = vec![0; context.num_colleges()];
        Ok(Self { context, rounds: Vec::new(), given })
    }

    pub fn rounds(&self) -> &[Vec<u32>] {
        &self.rounds
    }

    fn remaining_budget(&self) -> u32 {
        self.context.budget() - self.given.iter().sum::<u32>()
    }
}

impl AllocationState for BatchState {
    type Action = Vec<u32>;
    type Key = (usize, Vec<Vec<u32>>);

    fn context(&self) -> &Arc<ExpansionContext> {
        &self.context
    }

    fn depth(&self) -> usize {
        self.rounds.len()
    }

    fn max_depth(&self) -> usize {
        self.context.num_colleges()
    }

    /// 先按本轮总量升序，同一总量内按字典序
    ///
    /// 剩余学校预算之和始终不小于剩余总预算，所以除最后一轮外任何总量都可行。
    fn legal_actions(&self) -> Vec<Vec<u32>> {
        if self.is_terminal() {
            return Vec::new();
        }
        let remain = self.remaining_budget();
        let room: Vec<u32> = self
            .context
            .college_budgets()
            .iter()
            .zip(&self.given)
            .map(|(cap, used)| cap - used)
            .collect();
        let lowest = if self.depth() + 1 == self.max_depth() { remain } else { 0 };
        (lowest..=remain)
            .flat_map(|total| bounded_compositions(total, &room))
            .collect()
    }

    fn transition(&self, action: &Vec<u32>) -> Self {
        let mut next = self.clone();
        for (g, x) in next.given.iter_mut().zip(action) {
            *g += x;
        }
        next.rounds.push(action.clone());
        next
    }

    fn key(&self) -> Self::Key {
        let mut sorted = self.rounds.clone();
        sorted.sort_unstable();
        (self.depth(), sorted)
    }

    fn final_capacities(&self) -> Vec<u32> {
        self.context
            .base_capacities()
            .iter()
            .zip(&self.given)
            .map(|(base, extra)| base + extra)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::tests::fixture;

    fn root_with(budget: u32, college_budgets: Vec<u32>) -> Result<BatchState> {
        let mut instance = fixture();
        instance.budget = budget;
        instance.college_budgets = college_budgets;
        BatchState::new(ExpansionContext::new(instance, true)?)
    }

    #[test]
    fn test_round_actions() -> Result<()> {
        let root = root_with(1, vec![1, 0, 0, 1])?;
        // 空轮、只给 3、只给 0
        assert_eq!(root.legal_actions(), vec![vec![0, 0, 0, 0], vec![0, 0, 0, 1], vec![1, 0, 0, 0]]);
        let s = root.transition(&vec![0, 0, 0, 1]);
        assert_eq!(s.legal_actions(), vec![vec![0, 0, 0, 0]]);
        Ok(())
    }

    #[test]
    fn test_round_may_give_several_units_to_one_college() -> Result<()> {
        let root = root_with(2, vec![2, 1, 0, 0])?;
        assert_eq!(
            root.legal_actions(),
            vec![
                vec![0, 0, 0, 0],
                vec![0, 1, 0, 0],
                vec![1, 0, 0, 0],
                vec![1, 1, 0, 0],
                vec![2, 0, 0, 0]
            ]
        );
        Ok(())
    }

    #[test]
    fn test_last_round_must_finish_budget() -> Result<()> {
        let root = root_with(4, vec![4, 1, 0, 0])?;
        let empty = vec![0, 0, 0, 0];
        let s = root.transition(&vec![1, 0, 0, 0]).transition(&empty).transition(&empty);
        assert_eq!(s.legal_actions(), vec![vec![2, 1, 0, 0], vec![3, 0, 0, 0]]);
        let end = s.transition(&vec![3, 0, 0, 0]);
        assert!(end.is_terminal());
        assert_eq!(end.allocation(), vec![4, 0, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_single_college_can_take_more_than_round_count() -> Result<()> {
        // 四轮，但学校 0 要拿 5 个
        let root = root_with(5, vec![5, 0, 0, 0])?;
        let mut s = root.transition(&vec![5, 0, 0, 0]);
        while !s.is_terminal() {
            assert_eq!(s.legal_actions(), vec![vec![0, 0, 0, 0]]);
            s = s.transition(&vec![0, 0, 0, 0]);
        }
        assert_eq!(s.allocation(), vec![5, 0, 0, 0]);
        assert_eq!(s.final_capacities(), vec![6, 1, 1, 4]);
        Ok(())
    }

    #[test]
    fn test_every_leaf_uses_whole_budget() -> Result<()> {
        let mut stack = vec![root_with(3, vec![3, 1, 0, 2])?];
        let mut leaves = 0;
        while let Some(s) = stack.pop() {
            if s.is_terminal() {
                assert_eq!(s.allocation().iter().sum::<u32>(), 3);
                leaves += 1;
                continue;
            }
            let actions = s.legal_actions();
            assert!(!actions.is_empty());
            stack.extend(actions.iter().map(|a| s.transition(a)));
        }
        assert!(leaves > 0);
        Ok(())
    }

    #[test]
    fn test_rounds_commute() -> Result<()> {
        let root = root_with(2, vec![2, 2, 2, 2])?;
        let a = root.transition(&vec![1, 0, 0, 0]).transition(&vec![0, 1, 0, 0]);
        let b = root.transition(&vec![0, 1, 0, 0]).transition(&vec![1, 0, 0, 0]);
        assert_eq!(a.key(), b.key());
        assert_eq!(a.final_capacities(), b.final_capacities());
        Ok(())
    }

    #[test]
    fn test_infeasible_budget_is_error() {
        assert!(root_with(5, vec![1, 1, 1, 1]).is_err());
    }
}

//! 按优先级逐层分配：第 l 层决定 order[l] 号学校获得多少单位，深度等于学校数

use std::sync::Arc;

use anyhow::{Result, bail};

use super::{AllocationState, ExpansionContext};

#[derive(Debug, Clone)]
pub struct PriorityState {
    context: Arc<ExpansionContext>,
    /// 学校被决定的顺序
    order: Arc<Vec<usize>>,
    /// history[l] = order[l] 号学校获得的单位数
    history: Vec<u32>,
    /// history 之和
    used: u32
}

impl PriorityState {
    pub fn new(context: Arc<ExpansionContext>, order: Vec<usize>) -> Result<Self> {
        let c = context.num_colleges();
        let mut sorted = order.clone();
        sorted.sort_unstable();
        if sorted != (0..c).collect::<Vec<_>>() {
            bail!("优先级顺序 {order:?} 不是 0..{c} 的排列");
        }
        if !context.instance().is_budget_feasible() {
            bail!(
                "总预算 {} 超过学校预算之和 {:?}，不存在可行分配",
                context.budget(),
                context.college_budgets()
            );
        }
        Ok(Self {
            context,
            order: Arc::new(order),
            history: Vec::new(),
            used: 0
        })
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn history(&self) -> &[u32] {
        &self.history
    }
}

impl AllocationState for PriorityState {
    type Action = u32;
    type Key = (usize, Vec<u32>);

    fn context(&self) -> &Arc<ExpansionContext> {
        &self.context
    }

    fn depth(&self) -> usize {
        self.history.len()
    }

    fn max_depth(&self) -> usize {
        self.context.num_colleges()
    }

    fn legal_actions(&self) -> Vec<u32> {
        if self.is_terminal() {
            return Vec::new();
        }
        let level = self.depth();
        let caps = self.context.college_budgets();
        let budget = self.context.budget() as u64;
        let remain = self.context.budget() - self.used;
        // 之后各层最多还能分出的单位
        let rest: u64 = self.order[level + 1..].iter().map(|j| caps[*j] as u64).sum();
        let upper = remain.min(caps[self.order[level]]);
        (0..=upper)
            .filter(|i| (self.used + i) as u64 + rest >= budget)
            .collect()
    }

    fn transition(&self, action: &u32) -> Self {
        let mut next = self.clone();
        next.history.push(*action);
        next.used += action;
        next
    }

    fn key(&self) -> Self::Key {
        (self.depth(), self.history.clone())
    }

    fn final_capacities(&self) -> Vec<u32> {
        let mut capacities = self.context.base_capacities().to_vec();
        for (level, extra) in self.history.iter().enumerate() {
            capacities[self.order[level]] += extra;
        }
        capacities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::tests::fixture;

    fn root_with(budget: u32, college_budgets: Vec<u32>, order: Vec<usize>) -> Result<PriorityState> {
        let mut instance = fixture();
        instance.budget = budget;
        instance.college_budgets = college_budgets;
        PriorityState::new(ExpansionContext::new(instance, true)?, order)
    }

    #[test]
    fn test_forward_feasibility_prune() -> Result<()> {
        // 后面三个学校最多还能拿 1 个，所以第一层至少给 2 个
        let root = root_with(3, vec![3, 1, 0, 0], vec![0, 1, 2, 3])?;
        assert_eq!(root.legal_actions(), vec![2, 3]);
        let s = root.transition(&2);
        assert_eq!(s.legal_actions(), vec![1]);
        let s = s.transition(&1);
        assert_eq!(s.legal_actions(), vec![0]);
        let end = s.transition(&0).transition(&0);
        assert!(end.is_terminal());
        assert_eq!(end.allocation(), vec![2, 1, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_order_maps_levels_to_colleges() -> Result<()> {
        let root = root_with(2, vec![2, 2, 2, 2], vec![3, 1, 0, 2])?;
        let end = root.transition(&1).transition(&0).transition(&1).transition(&0);
        assert!(end.is_terminal());
        assert_eq!(end.final_capacities(), vec![2, 1, 1, 5]);
        assert_eq!(end.key(), (4, vec![1, 0, 1, 0]));
        Ok(())
    }

    #[test]
    fn test_every_leaf_uses_whole_budget() -> Result<()> {
        let root = root_with(3, vec![2, 1, 2, 1], vec![0, 1, 2, 3])?;
        let mut stack = vec![root];
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
        // x0 + x1 + x2 + x3 = 3, x0 <= 2, x1 <= 1, x2 <= 2, x3 <= 1
        assert_eq!(leaves, 10);
        Ok(())
    }

    #[test]
    fn test_rejects_bad_order_and_budget() {
        assert!(root_with(2, vec![2, 2, 2, 2], vec![0, 1, 2]).is_err());
        assert!(root_with(2, vec![2, 2, 2, 2], vec![0, 1, 1, 3]).is_err());
        assert!(root_with(9, vec![2, 2, 2, 2], vec![0, 1, 2, 3]).is_err());
    }
}

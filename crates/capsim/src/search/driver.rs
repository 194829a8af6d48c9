//! rollout 循环
//!
//! 在 rollout 上限内反复调用引擎，根节点完全枚举时提前结束，
//! 并记录每次 rollout 后的最好奖励曲线。

use std::time::Instant;

use anyhow::Result;
use log::{debug, info};

use super::{
    SearchConfig,
    result::{RolloutRecord, SearchOutcome},
    uct_amaf::{ROOT, UctAmaf}
};
use crate::expansion::AllocationState;

#[derive(Debug, Clone)]
pub struct SearchDriver {
    config: SearchConfig
}

impl SearchDriver {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// 从根状态开始搜索
    pub fn run<S: AllocationState>(&self, root: S) -> Result<SearchOutcome<S>> {
        let limit = self.config.rollout_limit(root.context().budget());
        let log_interval = self.config.log_interval.max(1);
        let mut engine = UctAmaf::new(root, &self.config);
        let mut records = Vec::with_capacity(limit.min(1 << 20));
        let start = Instant::now();

        debug!(
            "开始搜索: 最多 {limit} 次 rollout, exploration_weight = {:.4}",
            self.config.exploration_weight
        );
        for i in 0..limit {
            if engine.is_fully_explored() {
                info!("第 {i} 次 rollout 前根节点已完全枚举，提前结束");
                break;
            }
            engine.do_rollout(ROOT)?;
            records.push(RolloutRecord {
                reward: engine.best_reward(),
                run_time: start.elapsed().as_secs_f64()
            });
            if (i + 1) % log_interval == 0 {
                info!(
                    "rollout {}/{limit}: best = {:.6}, 节点数 = {}",
                    i + 1,
                    engine.best_reward(),
                    engine.len()
                );
            }
        }

        let (best_state, best_reward) = match engine.best_state() {
            Some(state) => (state.clone(), engine.best_reward()),
            None => {
                let state = engine.best_line(ROOT)?;
                let reward = state.reward()?;
                (state, reward)
            }
        };
        Ok(SearchOutcome {
            best_state,
            best_reward,
            rollouts: records.len(),
            records,
            nodes: engine.len(),
            fully_explored: engine.is_fully_explored(),
            run_time: start.elapsed().as_secs_f64()
        })
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;
    use crate::{
        expansion::{BatchState, ExpansionContext, IterativeState, PriorityState},
        instance::tests::fixture
    };

    fn driver(seed: u64) -> SearchDriver {
        SearchDriver::new(SearchConfig::default().with_seed(Some(seed)))
    }

    #[test]
    fn test_stops_when_fully_explored() -> Result<()> {
        let ctx = ExpansionContext::new(fixture(), true)?;
        let outcome = driver(11).run(IterativeState::new(ctx)?)?;
        assert!(outcome.fully_explored);
        assert!(outcome.rollouts < 2000);
        assert_eq!(outcome.records.len(), outcome.rollouts);
        let last = outcome.records.last().ok_or_else(|| anyhow!("没有记录"))?;
        assert_eq!(last.reward, outcome.best_reward);
        assert!(outcome.records.windows(2).all(|w| w[0].reward <= w[1].reward));
        Ok(())
    }

    #[test]
    fn test_rollout_limit_is_respected() -> Result<()> {
        let ctx = ExpansionContext::new(fixture(), true)?;
        let config = SearchConfig::default().with_seed(Some(12)).with_max_rollouts(Some(3));
        let outcome = SearchDriver::new(config).run(IterativeState::new(ctx)?)?;
        assert_eq!(outcome.rollouts, 3);
        assert!(outcome.best_state.is_terminal());
        Ok(())
    }

    #[test]
    fn test_zero_rollouts_falls_back_to_best_line() -> Result<()> {
        let ctx = ExpansionContext::new(fixture(), true)?;
        let config = SearchConfig::default().with_seed(Some(13)).with_max_rollouts(Some(0));
        let outcome = SearchDriver::new(config).run(IterativeState::new(ctx)?)?;
        assert_eq!(outcome.rollouts, 0);
        assert!(outcome.best_state.is_terminal());
        assert_eq!(outcome.allocation().iter().sum::<u32>(), 2);
        Ok(())
    }

    #[test]
    fn test_zero_budget_every_variant() -> Result<()> {
        let mut instance = fixture();
        instance.budget = 0;
        let ctx = ExpansionContext::new(instance, true)?;
        let base = ctx.base_capacities().to_vec();

        let outcome = driver(14).run(IterativeState::new(ctx.clone())?)?;
        assert_eq!(outcome.final_capacities(), base);
        assert_eq!(outcome.best_reward, 0.0);

        let outcome = driver(15).run(PriorityState::new(ctx.clone(), vec![0, 1, 2, 3])?)?;
        assert_eq!(outcome.final_capacities(), base);
        assert_eq!(outcome.best_reward, 0.0);

        let outcome = driver(16).run(BatchState::new(ctx.clone())?)?;
        assert_eq!(outcome.final_capacities(), base);
        assert_eq!(outcome.best_reward, 0.0);
        Ok(())
    }
}

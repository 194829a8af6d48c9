//! 扩容算法
//!
//! 每种算法给出一个最终容量向量，统一包装成 `ExpansionResult`。
//! UCT 系列额外返回每次 rollout 的记录。

use std::{fmt::Display, time::Instant};

use anyhow::Result;
use enum_iterator::Sequence;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    config::UctSettings,
    expansion::{ExpansionContext, PriorityOrder},
    instance::MarketInstance,
    search::RolloutRecord
};

pub mod exhaustive;
pub mod greedy;
pub mod uct;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Sequence)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// 每步把一个单位给当前收益最大的学校
    Greedy,
    /// 枚举全部可行分配
    Exhaustive,
    UctIterative,
    UctPriority,
    UctPriorityEnvy,
    UctPriorityPopularity,
    UctPriorityRandom,
    UctBatch
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Greedy => "greedy",
            Self::Exhaustive => "exhaustive",
            Self::UctIterative => "uct_iterative",
            Self::UctPriority => "uct_priority",
            Self::UctPriorityEnvy => "uct_priority_envy",
            Self::UctPriorityPopularity => "uct_priority_popularity",
            Self::UctPriorityRandom => "uct_priority_random",
            Self::UctBatch => "uct_batch"
        };
        write!(f, "{name}")
    }
}

impl Algorithm {
    /// 按学校逐层分配时使用的顺序，其他算法为 None
    pub fn priority_order(&self) -> Option<PriorityOrder> {
        match self {
            Self::UctPriority => Some(PriorityOrder::Identity),
            Self::UctPriorityEnvy => Some(PriorityOrder::Envy),
            Self::UctPriorityPopularity => Some(PriorityOrder::Popularity),
            Self::UctPriorityRandom => Some(PriorityOrder::Random),
            _ => None
        }
    }

    pub fn is_uct(&self) -> bool {
        !matches!(self, Self::Greedy | Self::Exhaustive)
    }
}

/// 一个算法的最终结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionResult {
    pub algorithm: Algorithm,
    /// 扩容后的容量
    pub expanded_capacities: Vec<u32>,
    /// 扩容后的总代价
    pub best_cost: f64,
    /// 耗时（秒）
    pub run_time: f64,
    /// (基准代价 - 最好代价) / 基准代价，基准为 0 时为 0
    pub improvement_rate: f64
}

impl ExpansionResult {
    pub fn new(algorithm: Algorithm, context: &ExpansionContext, capacities: Vec<u32>, run_time: f64) -> Result<Self> {
        let best_cost = context.evaluate(&capacities)?;
        Ok(Self {
            algorithm,
            improvement_rate: context.improvement(best_cost),
            expanded_capacities: capacities,
            best_cost,
            run_time
        })
    }

    /// 每个学校获得的追加容量
    pub fn allocation(&self, base: &[u32]) -> Vec<u32> {
        self.expanded_capacities
            .iter()
            .zip(base)
            .map(|(x, b)| x.saturating_sub(*b))
            .collect()
    }
}

/// 在一个实例上运行一种算法
pub fn run_algorithm(
    algorithm: Algorithm,
    instance: &MarketInstance,
    settings: &UctSettings,
    seed: u64
) -> Result<(ExpansionResult, Option<Vec<RolloutRecord>>)> {
    let start = Instant::now();
    let context = ExpansionContext::new(instance.clone(), settings.use_cache)?;
    let (capacities, records) = match algorithm {
        Algorithm::Greedy => (greedy::run(&context)?, None),
        Algorithm::Exhaustive => (exhaustive::enumerate_best(&context)?.capacities, None),
        _ => {
            let (capacities, records) = uct::run(algorithm, &context, settings, seed)?;
            (capacities, Some(records))
        }
    };
    let result = ExpansionResult::new(algorithm, &context, capacities, start.elapsed().as_secs_f64())?;
    info!(
        "[{algorithm}] 代价 {} -> {}, 改进 {:.2}%, 用时 {:.3}s",
        context.baseline_cost(),
        result.best_cost,
        result.improvement_rate * 100.0,
        result.run_time
    );
    context.log_stats();
    Ok((result, records))
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use enum_iterator::all;

    use super::*;
    use crate::instance::tests::fixture;

    #[test]
    fn test_algorithm_names() -> Result<()> {
        for alg in all::<Algorithm>() {
            let json = serde_json::to_string(&alg)?;
            assert_eq!(json, format!("\"{alg}\""));
        }
        assert_eq!(Algorithm::UctPriorityEnvy.priority_order(), Some(PriorityOrder::Envy));
        assert_eq!(Algorithm::UctBatch.priority_order(), None);
        assert!(!Algorithm::Exhaustive.is_uct());
        Ok(())
    }

    #[test]
    fn test_every_algorithm_on_fixture() -> Result<()> {
        let instance = fixture();
        let settings = UctSettings::default();
        let (optimum, _) = run_algorithm(Algorithm::Exhaustive, &instance, &settings, 0)?;
        for alg in all::<Algorithm>() {
            let (result, records) = run_algorithm(alg, &instance, &settings, 42)?;
            assert_eq!(result.algorithm, alg);
            assert_eq!(result.allocation(&instance.capacities).iter().sum::<u32>(), instance.budget);
            assert!(result.best_cost >= optimum.best_cost);
            assert_eq!(records.is_some(), alg.is_uct());
            // 预算很小，UCT 一定能枚举完整棵树
            if alg.is_uct() {
                assert_eq!(result.best_cost, optimum.best_cost, "{alg}");
            }
        }
        Ok(())
    }

    #[test]
    fn test_zero_budget_every_algorithm() -> Result<()> {
        let mut instance = fixture();
        instance.budget = 0;
        for alg in all::<Algorithm>() {
            let (result, _) = run_algorithm(alg, &instance, &UctSettings::default(), 1)?;
            assert_eq!(result.expanded_capacities, instance.capacities, "{alg}");
            assert_eq!(result.improvement_rate, 0.0);
        }
        Ok(())
    }
}

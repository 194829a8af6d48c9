//! UCT-AMAF 系列算法：构造对应变体的根状态并搜索

use std::sync::Arc;

use anyhow::{Result, bail};
use log::info;
use rand::{SeedableRng, rngs::StdRng};

use super::Algorithm;
use crate::{
    config::UctSettings,
    expansion::{AllocationState, BatchState, ExpansionContext, IterativeState, PriorityState},
    search::{RolloutRecord, SearchConfig, SearchDriver}
};

/// 返回最好分配的容量和 rollout 记录
pub fn run(
    algorithm: Algorithm,
    context: &Arc<ExpansionContext>,
    settings: &UctSettings,
    seed: u64
) -> Result<(Vec<u32>, Vec<RolloutRecord>)> {
    let config = SearchConfig::from_settings(settings).with_seed(Some(seed));
    match algorithm {
        Algorithm::UctIterative => search(IterativeState::new(context.clone())?, config),
        Algorithm::UctBatch => search(BatchState::new(context.clone())?, config),
        _ => match algorithm.priority_order() {
            Some(priority) => {
                let mut rng = StdRng::seed_from_u64(seed);
                let order = priority.compute(context, &mut rng);
                info!("[{algorithm}] 学校顺序 {order:?}");
                search(PriorityState::new(context.clone(), order)?, config)
            }
            None => bail!("{algorithm} 不是 UCT 算法")
        }
    }
}

fn search<S: AllocationState>(root: S, config: SearchConfig) -> Result<(Vec<u32>, Vec<RolloutRecord>)> {
    let outcome = SearchDriver::new(config).run(root)?;
    info!(
        "{} 次 rollout, {} 个节点, 完全枚举: {}, 追加 {:?}",
        outcome.rollouts,
        outcome.nodes,
        outcome.fully_explored,
        outcome.allocation()
    );
    Ok((outcome.final_capacities(), outcome.records))
}

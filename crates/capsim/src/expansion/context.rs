use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering}
};

use anyhow::{Result, anyhow};
use hashbrown::HashMap;
use log::{debug, info};

use crate::{
    instance::MarketInstance,
    matching::{DeferredAcceptance, MatchingOutcome}
};

/// 一次搜索共享的不可变上下文
///
/// 包含市场实例、匹配求解器和基准代价。可选的代价缓存以最终容量为键，
/// 因为求解器是容量的纯函数，缓存不改变任何结果。
#[derive(Debug)]
pub struct ExpansionContext {
    instance: MarketInstance,
    oracle: DeferredAcceptance,
    baseline: MatchingOutcome,
    cache: Option<Mutex<HashMap<Vec<u32>, f64>>>,
    /// 实际调用求解器的次数
    oracle_calls: AtomicUsize,
    /// 命中缓存的次数
    cache_hits: AtomicUsize
}

impl ExpansionContext {
    pub fn new(instance: MarketInstance, use_cache: bool) -> Result<Arc<Self>> {
        instance.validate()?;
        let oracle = DeferredAcceptance::from_instance(&instance)?;
        let baseline = oracle.run(&instance.capacities)?;
        info!("基准代价: {}", baseline.total_cost);
        Ok(Arc::new(Self {
            instance,
            oracle,
            baseline,
            cache: use_cache.then(|| Mutex::new(HashMap::new())),
            oracle_calls: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0)
        }))
    }

    pub fn instance(&self) -> &MarketInstance {
        &self.instance
    }

    pub fn oracle(&self) -> &DeferredAcceptance {
        &self.oracle
    }

    /// 不扩容时的匹配
    pub fn baseline(&self) -> &MatchingOutcome {
        &self.baseline
    }

    pub fn baseline_cost(&self) -> f64 {
        self.baseline.total_cost
    }

    pub fn num_colleges(&self) -> usize {
        self.instance.num_colleges()
    }

    pub fn budget(&self) -> u32 {
        self.instance.budget
    }

    pub fn base_capacities(&self) -> &[u32] {
        &self.instance.capacities
    }

    pub fn college_budgets(&self) -> &[u32] {
        &self.instance.college_budgets
    }

    /// 给定容量下的匹配总代价
    pub fn evaluate(&self, capacities: &[u32]) -> Result<f64> {
        let Some(cache) = &self.cache else {
            self.oracle_calls.fetch_add(1, Ordering::Relaxed);
            return self.oracle.cost(capacities);
        };
        if let Some(cost) = cache.lock().map_err(|_| anyhow!("代价缓存锁已损坏"))?.get(capacities) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(*cost);
        }
        self.oracle_calls.fetch_add(1, Ordering::Relaxed);
        let cost = self.oracle.cost(capacities)?;
        cache
            .lock()
            .map_err(|_| anyhow!("代价缓存锁已损坏"))?
            .insert(capacities.to_vec(), cost);
        Ok(cost)
    }

    /// 相对基准的改进比例，可以为负；基准为 0 时定义为 0
    pub fn improvement(&self, cost: f64) -> f64 {
        let base = self.baseline_cost();
        if base == 0.0 { 0.0 } else { (base - cost) / base }
    }

    /// 终局容量对应的奖励
    pub fn reward_for(&self, capacities: &[u32]) -> Result<f64> {
        Ok(self.improvement(self.evaluate(capacities)?))
    }

    pub fn oracle_calls(&self) -> usize {
        self.oracle_calls.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn log_stats(&self) {
        debug!("求解器调用 {} 次, 缓存命中 {} 次", self.oracle_calls(), self.cache_hits());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::tests::fixture;

    #[test]
    fn test_cache_does_not_change_results() -> Result<()> {
        let cached = ExpansionContext::new(fixture(), true)?;
        let plain = ExpansionContext::new(fixture(), false)?;
        for caps in [[1, 1, 1, 4], [2, 1, 1, 4], [1, 3, 1, 4], [1, 3, 1, 4]] {
            assert_eq!(cached.evaluate(&caps)?, plain.evaluate(&caps)?);
        }
        assert_eq!(cached.oracle_calls(), 3);
        assert_eq!(cached.cache_hits(), 1);
        assert_eq!(plain.oracle_calls(), 4);
        Ok(())
    }

    #[test]
    fn test_reward_sign_and_zero_baseline() -> Result<()> {
        let ctx = ExpansionContext::new(fixture(), true)?;
        assert_eq!(ctx.baseline_cost(), 7.0);
        assert_eq!(ctx.reward_for(&[1, 1, 1, 4])?, 0.0);
        // 把学校 3 的容量拿走会让结果变差
        assert!(ctx.reward_for(&[1, 1, 1, 0])? < 0.0);

        let mut happy = fixture();
        happy.capacities = vec![7, 7, 7, 7];
        let ctx = ExpansionContext::new(happy, false)?;
        assert_eq!(ctx.baseline_cost(), 0.0);
        assert_eq!(ctx.reward_for(&[7, 7, 7, 7])?, 0.0);
        assert_eq!(ctx.improvement(3.0), 0.0);
        Ok(())
    }
}

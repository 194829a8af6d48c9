//! 搜索配置
//!
//! 定义 UCT-AMAF 搜索和 rollout 循环的参数。
use crate::config::UctSettings;

/// 搜索配置
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// UCB 探索系数
    ///
    /// UCB 公式: Q/N + exploration_weight * sqrt(ln(N_parent) / N)
    /// 奖励是相对改进比例，数值很小，所以默认系数也很小。
    pub exploration_weight: f64,

    /// 每单位预算的 rollout 次数
    ///
    /// 未指定 `max_rollouts` 时，上限为 rollouts_per_unit * max(budget, 1)。
    pub rollouts_per_unit: usize,

    /// rollout 次数上限（覆盖 rollouts_per_unit）
    pub max_rollouts: Option<usize>,

    /// 每隔多少次 rollout 输出一次进度
    pub log_interval: usize,

    /// 是否缓存求解器结果
    pub use_cache: bool,

    /// 随机种子，None 时使用系统熵
    pub seed: Option<u64>
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exploration_weight: 0.002f64.sqrt(),
            rollouts_per_unit: 1000,
            max_rollouts: None,
            log_interval: 100,
            use_cache: true,
            seed: None
        }
    }
}

impl SearchConfig {
    /// 设置探索系数
    pub fn with_exploration_weight(mut self, weight: f64) -> Self {
        self.exploration_weight = weight;
        self
    }

    /// 设置每单位预算的 rollout 次数
    pub fn with_rollouts_per_unit(mut self, n: usize) -> Self {
        self.rollouts_per_unit = n;
        self
    }

    /// 设置 rollout 上限
    pub fn with_max_rollouts(mut self, n: Option<usize>) -> Self {
        self.max_rollouts = n;
        self
    }

    /// 设置日志间隔
    pub fn with_log_interval(mut self, n: usize) -> Self {
        self.log_interval = n;
        self
    }

    /// 启用/禁用求解器缓存
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    /// 设置随机种子
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// 给定预算下的 rollout 上限
    pub fn rollout_limit(&self, budget: u32) -> usize {
        self.max_rollouts
            .unwrap_or(self.rollouts_per_unit * (budget as usize).max(1))
    }

    pub fn from_settings(settings: &UctSettings) -> Self {
        SearchConfig::default()
            .with_exploration_weight(settings.exploration_weight)
            .with_rollouts_per_unit(settings.rollouts_per_unit)
            .with_max_rollouts(settings.max_rollouts)
            .with_log_interval(settings.log_interval)
            .with_cache(settings.use_cache)
    }
}

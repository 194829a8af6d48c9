//! 运行配置
//!
//! 从 `expansion_config.toml` 读取，每个字段都有默认值，空文件也能运行。

use anyhow::{Context, Result};
use enum_iterator::all;
use serde::{Deserialize, Serialize};

use crate::{instance::SyntheticConfig, solver::Algorithm};

/// UCT 搜索参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UctSettings {
    /// UCB 探索系数
    #[serde(default = "default_exploration_weight")]
    pub exploration_weight: f64,
    /// 每单位预算的 rollout 次数
    #[serde(default = "default_rollouts_per_unit")]
    pub rollouts_per_unit: usize,
    /// rollout 上限，设置后覆盖 rollouts_per_unit
    #[serde(default)]
    pub max_rollouts: Option<usize>,
    /// 进度日志间隔
    #[serde(default = "default_log_interval")]
    pub log_interval: usize,
    /// 是否缓存求解器结果
    #[serde(default = "default_use_cache")]
    pub use_cache: bool
}

impl Default for UctSettings {
    fn default() -> Self {
        Self {
            exploration_weight: default_exploration_weight(),
            rollouts_per_unit: default_rollouts_per_unit(),
            max_rollouts: None,
            log_interval: default_log_interval(),
            use_cache: default_use_cache()
        }
    }
}

fn default_exploration_weight() -> f64 {
    0.002f64.sqrt()
}

fn default_rollouts_per_unit() -> usize {
    1000
}

fn default_log_interval() -> usize {
    100
}

fn default_use_cache() -> bool {
    true
}

/// 运行配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionConfig {
    /// 日志级别: "info" | "debug" | "off" ...
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 要运行的算法，默认全部
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<Algorithm>,
    /// 结果输出目录，每次运行在其下新建一个带时间戳的子目录
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// 随机种子，不填时随机生成
    #[serde(default)]
    pub seed: Option<u64>,
    /// 实例 JSON 路径，不填时使用合成实例
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default)]
    pub uct: UctSettings,
    #[serde(default)]
    pub synthetic: SyntheticConfig
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            algorithms: default_algorithms(),
            output_dir: default_output_dir(),
            seed: None,
            instance: None,
            uct: UctSettings::default(),
            synthetic: SyntheticConfig::default()
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_algorithms() -> Vec<Algorithm> {
    all::<Algorithm>().collect()
}

fn default_output_dir() -> String {
    "results".to_string()
}

impl ExpansionConfig {
    /// 读取配置文件，文件不存在时使用默认配置
    pub fn load(path: &str) -> Result<Self> {
        if !fs_err::exists(path)? {
            return Ok(Self::default());
        }
        let text = fs_err::read_to_string(path)?;
        toml::from_str(&text).with_context(|| format!("解析配置文件 {path} 失败"))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() -> Result<()> {
        let config: ExpansionConfig = toml::from_str("")?;
        assert_eq!(config, ExpansionConfig::default());
        assert_eq!(config.algorithms.len(), 8);
        assert_eq!(config.uct.rollouts_per_unit, 1000);
        assert!((config.uct.exploration_weight - 0.002f64.sqrt()).abs() < 1e-15);
        assert_eq!(config.synthetic, SyntheticConfig::default());
        Ok(())
    }

    #[test]
    fn test_partial_config() -> Result<()> {
        let text = r#"
            log_level = "debug"
            algorithms = ["greedy", "uct_priority_envy"]
            seed = 7

            [uct]
            max_rollouts = 500

            [synthetic]
            num_students = 20
            correlation = 0.5
        "#;
        let config: ExpansionConfig = toml::from_str(text)?;
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.algorithms, vec![Algorithm::Greedy, Algorithm::UctPriorityEnvy]);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.uct.max_rollouts, Some(500));
        assert_eq!(config.uct.log_interval, 100);
        assert_eq!(config.synthetic.num_students, 20);
        assert_eq!(config.synthetic.num_colleges, 5);
        assert_eq!(config.synthetic.correlation, 0.5);
        Ok(())
    }

    #[test]
    fn test_unknown_algorithm_is_error() {
        assert!(toml::from_str::<ExpansionConfig>(r#"algorithms = ["lp"]"#).is_err());
    }
}

//! 合成实例生成器
//!
//! 学生偏好由公共分数和个体分数按相关系数混合得到；学校偏好为随机排列；
//! 基础容量为多项分布 + 1，保证总容量等于学生数。

use anyhow::{Result, bail};
use log::{debug, info};
use rand::{Rng, rngs::StdRng, seq::SliceRandom};
use rand_distr::{Binomial, Distribution, Uniform};
use serde::{Deserialize, Serialize};

use super::MarketInstance;
use crate::utils::stable_argsort;

/// 学校预算重抽的最大次数
const MAX_BUDGET_RETRIES: usize = 10_000;

/// 合成实例参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    /// 学生数
    #[serde(default = "default_num_students")]
    pub num_students: usize,
    /// 学校数
    #[serde(default = "default_num_colleges")]
    pub num_colleges: usize,
    /// 追加容量总数
    #[serde(default = "default_budget")]
    pub budget: u32,
    /// 学生偏好的相关系数，0 为完全独立，1 为完全一致
    #[serde(default)]
    pub correlation: f64,
    /// 是否为每个学校单独抽取预算上限
    #[serde(default = "default_college_wise_budget")]
    pub college_wise_budget: bool
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            num_students: default_num_students(),
            num_colleges: default_num_colleges(),
            budget: default_budget(),
            correlation: 0.0,
            college_wise_budget: default_college_wise_budget()
        }
    }
}

fn default_num_students() -> usize {
    50
}

fn default_num_colleges() -> usize {
    5
}

fn default_budget() -> u32 {
    5
}

fn default_college_wise_budget() -> bool {
    true
}

/// 生成一个合成实例
pub fn generate(config: &SyntheticConfig, rng: &mut StdRng) -> Result<MarketInstance> {
    let s = config.num_students;
    let c = config.num_colleges;
    if c == 0 || s < c {
        bail!("学生数 {s} 必须不少于学校数 {c} 且学校数大于 0");
    }
    if !(0.0..=1.0).contains(&config.correlation) {
        bail!("相关系数必须在 [0, 1] 内: {}", config.correlation);
    }
    let unit = Uniform::new(0.0, 1.0)?;

    // 学生偏好
    let common: Vec<f64> = (0..c).map(|_| unit.sample(rng)).collect();
    let student_prefs: Vec<Vec<usize>> = (0..s)
        .map(|_| {
            let mixed: Vec<f64> = common
                .iter()
                .map(|x| config.correlation * x + (1.0 - config.correlation) * unit.sample(rng))
                .collect();
            stable_argsort(&mixed)
        })
        .collect();

    // 学校偏好
    let college_prefs: Vec<Vec<usize>> = (0..c)
        .map(|_| {
            let mut order: Vec<usize> = (0..s).collect();
            order.shuffle(rng);
            order
        })
        .collect();

    let capacities: Vec<u32> = multinomial((s - c) as u64, c, rng)?
        .into_iter()
        .map(|x| x as u32 + 1)
        .collect();

    let college_budgets = if config.college_wise_budget {
        college_wise_budgets(config.budget, c, rng)?
    } else {
        vec![config.budget; c]
    };
    info!(
        "生成合成实例: {s} 学生, {c} 学校, 预算 {}, 相关系数 {:.1}",
        config.budget, config.correlation
    );
    debug!("容量 {capacities:?}, 学校预算 {college_budgets:?}");

    Ok(MarketInstance {
        student_prefs,
        college_prefs,
        capacities,
        budget: config.budget,
        college_budgets
    })
}

/// 每个学校至少 1，且都严格小于总预算
fn college_wise_budgets(budget: u32, c: usize, rng: &mut StdRng) -> Result<Vec<u32>> {
    if c < 2 || budget < 2 {
        bail!("按学校抽取预算需要至少 2 个学校且总预算至少为 2");
    }
    let high = budget as u64 * c as u64;
    for _ in 0..MAX_BUDGET_RETRIES {
        let total = rng.random_range(budget as u64..high);
        let budgets: Vec<u32> = multinomial(total, c, rng)?
            .into_iter()
            .map(|x| x as u32 + 1)
            .collect();
        if budgets.iter().all(|b| *b < budget) {
            return Ok(budgets);
        }
    }
    bail!("无法在 {MAX_BUDGET_RETRIES} 次内抽到合法的学校预算")
}

/// 等概率多项分布，用逐个条件二项分布采样
fn multinomial(n: u64, k: usize, rng: &mut StdRng) -> Result<Vec<u64>> {
    let mut remaining = n;
    let mut counts = Vec::with_capacity(k);
    for j in 0..k {
        if j + 1 == k {
            counts.push(remaining);
            break;
        }
        let p = 1.0 / (k - j) as f64;
        let x = Binomial::new(remaining, p)?.sample(rng);
        counts.push(x);
        remaining -= x;
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_generate_shapes() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        let config = SyntheticConfig {
            num_students: 30,
            num_colleges: 4,
            budget: 4,
            correlation: 0.5,
            college_wise_budget: true
        };
        let instance = generate(&config, &mut rng)?;
        instance.validate()?;
        assert_eq!(instance.num_students(), 30);
        assert_eq!(instance.num_colleges(), 4);
        assert_eq!(instance.capacities.iter().sum::<u32>(), 30);
        assert!(instance.capacities.iter().all(|x| *x >= 1));
        assert!(instance.college_budgets.iter().all(|b| *b >= 1 && *b < 4));
        assert!(instance.is_budget_feasible());
        Ok(())
    }

    #[test]
    fn test_generate_is_seeded() -> Result<()> {
        let config = SyntheticConfig::default();
        let a = generate(&config, &mut StdRng::seed_from_u64(11))?;
        let b = generate(&config, &mut StdRng::seed_from_u64(11))?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn test_full_correlation_gives_identical_lists() -> Result<()> {
        let config = SyntheticConfig {
            correlation: 1.0,
            college_wise_budget: false,
            ..Default::default()
        };
        let instance = generate(&config, &mut StdRng::seed_from_u64(3))?;
        assert!(instance.student_prefs.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(instance.college_budgets, vec![config.budget; config.num_colleges]);
        Ok(())
    }

    #[test]
    fn test_rejects_bad_config() {
        let mut rng = StdRng::seed_from_u64(0);
        let too_few_students = SyntheticConfig { num_students: 2, num_colleges: 3, ..Default::default() };
        assert!(generate(&too_few_students, &mut rng).is_err());
        let tiny_budget = SyntheticConfig { budget: 1, ..Default::default() };
        assert!(generate(&tiny_budget, &mut rng).is_err());
    }

    #[test]
    fn test_multinomial_sums() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(5);
        let counts = multinomial(100, 6, &mut rng)?;
        assert_eq!(counts.len(), 6);
        assert_eq!(counts.iter().sum::<u64>(), 100);
        Ok(())
    }
}

//! 市场实例
//!
//! 学生偏好、学校偏好、基础容量和扩容预算。实例在一次运行中不可变。

use anyhow::{Result, anyhow, bail};
use log::info;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

pub mod synthetic;

pub use synthetic::SyntheticConfig;

/// 多对一匹配市场
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInstance {
    /// 每个学生对全部学校的排序，最喜欢的在前
    pub student_prefs: Vec<Vec<usize>>,
    /// 每个学校对全部学生的排序，最喜欢的在前
    pub college_prefs: Vec<Vec<usize>>,
    /// 基础容量
    pub capacities: Vec<u32>,
    /// 可分配的追加容量总数
    pub budget: u32,
    /// 每个学校最多可以获得的追加容量
    pub college_budgets: Vec<u32>
}

impl MarketInstance {
    pub fn num_students(&self) -> usize {
        self.student_prefs.len()
    }

    pub fn num_colleges(&self) -> usize {
        self.college_prefs.len()
    }

    /// 检查形状和排列，不检查预算可行性（由搜索状态的根节点负责）
    pub fn validate(&self) -> Result<()> {
        let c = self.num_colleges();
        if self.capacities.len() != c {
            bail!("容量长度 {} 与学校数 {c} 不一致", self.capacities.len());
        }
        if self.college_budgets.len() != c {
            bail!("学校预算长度 {} 与学校数 {c} 不一致", self.college_budgets.len());
        }
        validate_permutations(&self.student_prefs, c, "学生")?;
        validate_permutations(&self.college_prefs, self.num_students(), "学校")?;
        Ok(())
    }

    /// 所有学校的预算上限之和是否足够分完总预算
    pub fn is_budget_feasible(&self) -> bool {
        self.college_budgets.iter().map(|x| *x as u64).sum::<u64>() >= self.budget as u64
    }

    pub fn load(path: &str) -> Result<Self> {
        let instance: Self = load_json(path)?;
        instance.validate()?;
        Ok(instance)
    }
}

/// 每一行都必须是 0..n 的排列
pub fn validate_permutations(rows: &[Vec<usize>], n: usize, who: &str) -> Result<()> {
    for (i, row) in rows.iter().enumerate() {
        if row.len() != n {
            bail!("{who} #{i} 的偏好长度为 {}，应为 {n}", row.len());
        }
        let mut seen = vec![false; n];
        for &x in row {
            let slot = seen
                .get_mut(x)
                .ok_or_else(|| anyhow!("{who} #{i} 的偏好包含越界下标 {x}"))?;
            if *slot {
                bail!("{who} #{i} 的偏好重复出现 {x}，不是排列");
            }
            *slot = true;
        }
    }
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    info!("载入数据 {path}");
    Ok(serde_json::from_str(&fs_err::read_to_string(path)?)?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 7 个学生 4 个学校的回归用例，学校 3 相当于兜底学校
    pub fn fixture() -> MarketInstance {
        MarketInstance {
            student_prefs: vec![
                vec![1, 2, 3, 0],
                vec![1, 2, 3, 0],
                vec![2, 1, 3, 0],
                vec![2, 1, 3, 0],
                vec![0, 3, 1, 2],
                vec![0, 3, 1, 2],
                vec![0, 3, 1, 2],
            ],
            college_prefs: vec![(0..7).collect(); 4],
            capacities: vec![1, 1, 1, 4],
            budget: 2,
            college_budgets: vec![2, 2, 2, 2]
        }
    }

    #[test]
    fn test_validate_fixture() -> Result<()> {
        fixture().validate()
    }

    #[test]
    fn test_validate_rejects_bad_prefs() {
        let mut duplicated = fixture();
        duplicated.student_prefs[2] = vec![2, 2, 3, 0];
        assert!(duplicated.validate().is_err());

        let mut short = fixture();
        short.college_prefs[1].pop();
        assert!(short.validate().is_err());

        let mut out_of_range = fixture();
        out_of_range.student_prefs[0] = vec![1, 2, 3, 4];
        assert!(out_of_range.validate().is_err());

        let mut wrong_budgets = fixture();
        wrong_budgets.college_budgets.push(1);
        assert!(wrong_budgets.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip() -> Result<()> {
        let instance = fixture();
        let text = serde_json::to_string(&instance)?;
        let back: MarketInstance = serde_json::from_str(&text)?;
        assert_eq!(back, instance);
        assert!(back.is_budget_feasible());
        Ok(())
    }
}

//! 优先级顺序：按学校逐层分配时，学校被决定的先后
//!
//! 相同关键字时按学校下标排序。

use std::fmt::Display;

use enum_iterator::Sequence;
use rand::{rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use super::ExpansionContext;
use crate::utils::stable_argsort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Sequence)]
#[serde(rename_all = "snake_case")]
pub enum PriorityOrder {
    /// 0, 1, ..., C-1
    #[default]
    Identity,
    /// 嫉妒人数少的学校在前
    Envy,
    /// 平均志愿位置靠后（冷门）的学校在前
    Popularity,
    /// 随机排列
    Random
}

impl Display for PriorityOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identity => write!(f, "identity"),
            Self::Envy => write!(f, "envy"),
            Self::Popularity => write!(f, "popularity"),
            Self::Random => write!(f, "random")
        }
    }
}

impl PriorityOrder {
    /// 计算学校顺序，嫉妒数基于不扩容时的匹配
    pub fn compute(&self, context: &ExpansionContext, rng: &mut StdRng) -> Vec<usize> {
        let c = context.num_colleges();
        let prefs = &context.instance().student_prefs;
        match self {
            Self::Identity => (0..c).collect(),
            Self::Envy => {
                let mut envy = vec![0usize; c];
                for (i, row) in prefs.iter().enumerate() {
                    let matched = context.baseline().assignment[i];
                    for j in row {
                        if Some(*j) == matched {
                            break;
                        }
                        envy[*j] += 1;
                    }
                }
                stable_argsort(&envy)
            }
            Self::Popularity => {
                let mut position = vec![0.0f64; c];
                for row in prefs {
                    for (k, j) in row.iter().enumerate() {
                        position[*j] += k as f64;
                    }
                }
                let n = prefs.len().max(1) as f64;
                let negated: Vec<f64> = position.iter().map(|x| -x / n).collect();
                stable_argsort(&negated)
            }
            Self::Random => {
                let mut order: Vec<usize> = (0..c).collect();
                order.shuffle(rng);
                order
            }
        }
    }
}

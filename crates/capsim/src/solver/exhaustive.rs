//! 穷举：枚举所有 0 <= x_j <= cb_j 且 sum(x) = budget 的分配

use anyhow::{Result, anyhow, bail};
use log::{info, warn};
use rayon::prelude::*;

use crate::{expansion::ExpansionContext, utils::bounded_compositions};

/// 超过这个数量时给出警告
const LARGE_ENUMERATION: usize = 1_000_000;

/// 穷举得到的最优分配
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// 追加容量
    pub allocation: Vec<u32>,
    /// 最终容量
    pub capacities: Vec<u32>,
    pub cost: f64
}

/// 代价最低的分配，平局取字典序最小的
pub fn enumerate_best(context: &ExpansionContext) -> Result<Candidate> {
    let allocations = bounded_compositions(context.budget(), context.college_budgets());
    if allocations.is_empty() {
        bail!(
            "总预算 {} 超过学校预算之和 {:?}，不存在可行分配",
            context.budget(),
            context.college_budgets()
        );
    }
    if allocations.len() > LARGE_ENUMERATION {
        warn!("穷举 {} 个分配，可能需要很长时间", allocations.len());
    }
    info!("穷举 {} 个可行分配", allocations.len());

    let base = context.base_capacities();
    let costs = allocations
        .par_iter()
        .map(|x| {
            let capacities: Vec<u32> = base.iter().zip(x).map(|(b, e)| b + e).collect();
            context.evaluate(&capacities)
        })
        .collect::<Result<Vec<f64>>>()?;

    let (index, cost) = costs
        .iter()
        .copied()
        .enumerate()
        .reduce(|a, b| if b.1 < a.1 { b } else { a })
        .ok_or_else(|| anyhow!("没有可行分配"))?;
    let allocation = allocations[index].clone();
    let capacities = base.iter().zip(&allocation).map(|(b, e)| b + e).collect();
    Ok(Candidate { allocation, capacities, cost })
}

//! 贪心：每一步试着给每个未满的学校加一个单位，保留代价最低的那个

use anyhow::{Result, anyhow, bail};
use log::debug;
use rayon::prelude::*;

use crate::expansion::ExpansionContext;

/// 返回扩容后的容量
pub fn run(context: &ExpansionContext) -> Result<Vec<u32>> {
    if !context.instance().is_budget_feasible() {
        bail!(
            "总预算 {} 超过学校预算之和 {:?}，不存在可行分配",
            context.budget(),
            context.college_budgets()
        );
    }
    let caps = context.college_budgets();
    let mut capacities = context.base_capacities().to_vec();
    let mut given = vec![0u32; caps.len()];

    for step in 0..context.budget() {
        let candidates: Vec<usize> = (0..caps.len()).filter(|j| given[*j] < caps[*j]).collect();
        let costs = candidates
            .par_iter()
            .map(|&j| {
                let mut trial = capacities.clone();
                trial[j] += 1;
                context.evaluate(&trial).map(|cost| (j, cost))
            })
            .collect::<Result<Vec<_>>>()?;
        // 候选按下标升序，严格小于保证平局取下标小的
        let (best, cost) = costs
            .into_iter()
            .reduce(|a, b| if b.1 < a.1 { b } else { a })
            .ok_or_else(|| anyhow!("第 {step} 步没有可扩容的学校"))?;
        debug!("贪心第 {step} 步: 学校 {best}, 代价 {cost}");
        capacities[best] += 1;
        given[best] += 1;
    }
    Ok(capacities)
}

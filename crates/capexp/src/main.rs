//! capexp - 扩容搜索实验
//!
//! 读取 `expansion_config.toml`，载入或生成一个实例，并行运行配置中的算法，
//! 打印结果表并把结果写到带时间戳的输出目录。
//!
//! # 用法
//! ```bash
//! cargo run --release --bin capexp -- --seed 42 --output results
//! ```

use std::{path::PathBuf, time::Instant};

use anyhow::Result;
use capsim::{
    config::ExpansionConfig,
    instance::{MarketInstance, synthetic},
    matching::DeferredAcceptance,
    report::{RunSetting, save_result, save_setting},
    solver::{Algorithm, run_algorithm},
    utils::{init_logger, make_table}
};
use clap::Parser;
use colored::Colorize;
use enum_iterator::all;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rayon::prelude::*;

/// 命令行参数，优先于配置文件
#[derive(Parser, Debug)]
#[command(name = "capexp")]
#[command(about = "稳定匹配市场的扩容搜索")]
struct Args {
    /// 配置文件路径
    #[arg(long, default_value = "expansion_config.toml")]
    config: String,

    /// 实例 JSON 路径，不填时生成合成实例
    #[arg(long)]
    instance: Option<String>,

    /// 随机种子
    #[arg(long)]
    seed: Option<u64>,

    /// 输出目录
    #[arg(long)]
    output: Option<String>,

    /// 从之前的运行目录读取 setting.json，复用其中的实例和种子
    #[arg(long, value_name = "DIR")]
    load_seed: Option<PathBuf>,

    /// 只列出可用算法
    #[arg(long)]
    list_algorithms: bool
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.list_algorithms {
        for alg in all::<Algorithm>() {
            println!("{alg}");
        }
        return Ok(());
    }

    let mut config = ExpansionConfig::load(&args.config)?;
    if args.instance.is_some() {
        config.instance = args.instance;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(output) = args.output {
        config.output_dir = output;
    }
    init_logger("capexp", &config.log_level)?;

    let (seed, instance, correlation) = match &args.load_seed {
        Some(dir) => {
            let setting = RunSetting::load(dir)?;
            info!("复用 {} 的实例和种子 {}", dir.display(), setting.seed);
            (setting.seed, setting.instance, setting.correlation)
        }
        None => {
            let seed = config.seed.unwrap_or_else(|| rand::rng().random());
            let mut rng = StdRng::seed_from_u64(seed);
            match &config.instance {
                Some(path) => (seed, MarketInstance::load(path)?, None),
                None => (
                    seed,
                    synthetic::generate(&config.synthetic, &mut rng)?,
                    Some(config.synthetic.correlation)
                )
            }
        }
    };
    let baseline_cost = DeferredAcceptance::from_instance(&instance)?.cost(&instance.capacities)?;

    println!("{}", "=== 扩容搜索 ===".bright_cyan());
    println!(
        "学生 {}, 学校 {}, 预算 {}, 种子 {seed}",
        instance.num_students(),
        instance.num_colleges(),
        instance.budget
    );
    println!("基础容量: {:?}", instance.capacities);
    println!("学校预算: {:?}", instance.college_budgets);
    println!("基准代价: {baseline_cost}");

    let out_dir = PathBuf::from(&config.output_dir).join(chrono::Local::now().format("%Y%m%d-%H%M%S").to_string());
    save_setting(
        &out_dir,
        &RunSetting { instance: instance.clone(), seed, correlation, baseline_cost }
    )?;

    // 每个算法一个独立种子，只取决于运行种子，复现时与实例来源无关
    let mut rng = StdRng::seed_from_u64(seed);
    let jobs: Vec<(Algorithm, u64)> = config.algorithms.iter().map(|alg| (*alg, rng.random())).collect();
    let pb = ProgressBar::new(jobs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-")
    );

    let start = Instant::now();
    let outcomes: Vec<_> = jobs
        .par_iter()
        .map(|(alg, alg_seed)| {
            let outcome = run_algorithm(*alg, &instance, &config.uct, *alg_seed);
            pb.inc(1);
            pb.set_message(alg.to_string());
            (*alg, outcome)
        })
        .collect();
    pb.finish_with_message("完成");

    let mut results = Vec::new();
    for (alg, outcome) in outcomes {
        match outcome {
            Ok((result, records)) => {
                save_result(&out_dir, &result, records.as_deref())?;
                results.push(result);
            }
            Err(e) => warn!("{alg} 失败: {e:#}")
        }
    }
    info!("全部算法用时 {:?}", start.elapsed());

    println!("{}", make_table(&results)?);
    let best = results
        .iter()
        .min_by(|a, b| a.best_cost.total_cmp(&b.best_cost));
    if let Some(best) = best {
        println!(
            "{}",
            format!(
                "最好: {} 代价 {} (改进 {:.2}%), 容量 {:?}",
                best.algorithm,
                best.best_cost,
                best.improvement_rate * 100.0,
                best.expanded_capacities
            )
            .bright_green()
        );
    }
    println!("结果已保存到 {}", out_dir.display());
    Ok(())
}

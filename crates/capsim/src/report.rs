//! 结果保存
//!
//! 目录结构:
//! - `<dir>/setting.json`: 实例、种子、相关系数、基准代价
//! - `<dir>/<algorithm>/result.json`: 最终结果
//! - `<dir>/<algorithm>/results.csv`: 每次 rollout 的最好奖励曲线

use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf}
};

use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{instance::MarketInstance, search::RolloutRecord, solver::ExpansionResult};

/// 一次运行的设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSetting {
    pub instance: MarketInstance,
    pub seed: u64,
    /// 合成实例的相关系数，读入的实例为 None
    pub correlation: Option<f64>,
    pub baseline_cost: f64
}

impl RunSetting {
    /// 读取之前某次运行目录下的 `setting.json`，用于复现该次运行
    pub fn load(dir: &Path) -> Result<Self> {
        let text = fs_err::read_to_string(dir.join("setting.json"))?;
        let setting: Self = serde_json::from_str(&text)?;
        setting.instance.validate()?;
        Ok(setting)
    }
}

pub fn save_setting(dir: &Path, setting: &RunSetting) -> Result<PathBuf> {
    fs_err::create_dir_all(dir)?;
    let path = dir.join("setting.json");
    fs_err::write(&path, serde_json::to_string_pretty(setting)?)?;
    info!("设置已保存到 {}", path.display());
    Ok(path)
}

/// 保存一个算法的结果，返回该算法的目录
pub fn save_result(dir: &Path, result: &ExpansionResult, records: Option<&[RolloutRecord]>) -> Result<PathBuf> {
    let alg_dir = dir.join(result.algorithm.to_string());
    fs_err::create_dir_all(&alg_dir)?;
    fs_err::write(alg_dir.join("result.json"), serde_json::to_string_pretty(result)?)?;

    if let Some(records) = records {
        let file = fs_err::File::create(alg_dir.join("results.csv"))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "#index,reward,run_time")?;
        for (i, r) in records.iter().enumerate() {
            writeln!(writer, "{i},{},{}", r.reward, r.run_time)?;
        }
        writer.flush()?;
    }
    Ok(alg_dir)
}

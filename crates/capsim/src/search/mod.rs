//! 搜索模块
//!
//! 在部分分配的有向无环图上做 UCT-AMAF 搜索。
//!
//! # 模块结构
//! - `config`: 搜索配置
//! - `node`: 搜索图节点
//! - `uct_amaf`: UCT-AMAF 引擎
//! - `driver`: rollout 循环
//! - `result`: rollout 记录和搜索输出

mod config;
mod driver;
mod node;
mod result;
mod uct_amaf;

pub use config::SearchConfig;
pub use driver::SearchDriver;
pub use node::SearchNode;
pub use result::{RolloutRecord, SearchOutcome};
pub use uct_amaf::{ROOT, UctAmaf};

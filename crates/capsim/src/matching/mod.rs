//! 稳定匹配模块
//!
//! 提供以容量向量为输入的稳定匹配求解器，作为扩容搜索的代价函数。

mod deferred_acceptance;

pub use deferred_acceptance::{DeferredAcceptance, MatchingOutcome};

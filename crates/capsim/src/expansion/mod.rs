//! 扩容分配状态
//!
//! # 模块结构
//! - `context`: 搜索共享的实例、求解器和基准代价
//! - `traits`: 搜索引擎使用的 `AllocationState` 接口
//! - `iterative`: 每步分配一个单位
//! - `priority`: 按学校优先级逐层决定分配数
//! - `batch`: 每轮给一组学校同时分配
//! - `order`: 优先级顺序的计算方法

mod batch;
mod context;
mod iterative;
mod order;
mod priority;
mod traits;

pub use batch::BatchState;
pub use context::ExpansionContext;
pub use iterative::IterativeState;
pub use order::PriorityOrder;
pub use priority::PriorityState;
pub use traits::AllocationState;

//! capsim - 多对一稳定匹配市场的扩容搜索
//!
//! 在有限的追加容量预算下，寻找使学生总不满意度最低的学校扩容方案。
//! 每个候选方案的代价都通过重新运行学生提议的延迟接受算法得到。
pub mod config;
pub mod expansion;
pub mod instance;
pub mod matching;
pub mod report;
pub mod search;
pub mod solver;
pub mod utils;

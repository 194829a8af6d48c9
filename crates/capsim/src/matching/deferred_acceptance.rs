//! 学生申请的延迟接受算法（同步轮次版本）
//!
//! 每一轮所有学生同时向游标所指的学校申请，学校只保留得分最高的 `capacity`
//! 个申请，其余拒绝，被拒的学生游标后移。某一轮没有任何拒绝时结束。
//! 一次 `run` 内部不保留任何状态，结果只取决于输入容量。

use anyhow::{Result, bail};
use log::trace;

use crate::instance::{MarketInstance, validate_permutations};

/// 一次匹配的结果
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingOutcome {
    /// 每个学生被录取的学校，`None` 表示被所有学校拒绝
    pub assignment: Vec<Option<usize>>,
    /// 所有学生录取学校在其偏好中的名次之和（从 0 开始）
    pub total_cost: f64,
    /// 执行的轮数
    pub rounds: usize,
    /// 累计拒绝次数
    pub rejections: usize
}

impl MatchingOutcome {
    /// 每个学校录取的人数
    pub fn college_counts(&self, num_colleges: usize) -> Vec<usize> {
        let mut counts = vec![0; num_colleges];
        for j in self.assignment.iter().flatten() {
            counts[*j] += 1;
        }
        counts
    }
}

/// 稳定匹配求解器，构造时预处理偏好表
#[derive(Debug, Clone)]
pub struct DeferredAcceptance {
    num_students: usize,
    num_colleges: usize,
    /// student_rank[i][k] = 学生 i 第 k 志愿的学校
    student_rank: Vec<Vec<usize>>,
    /// student_cost[i][j] = 学校 j 在学生 i 偏好中的名次
    student_cost: Vec<Vec<usize>>,
    /// college_score[j][i] = 学校 j 对学生 i 的打分，越高越好
    college_score: Vec<Vec<usize>>
}

impl DeferredAcceptance {
    /// 偏好必须是完整排列，否则返回数据格式错误
    pub fn new(student_prefs: &[Vec<usize>], college_prefs: &[Vec<usize>]) -> Result<Self> {
        let num_students = student_prefs.len();
        let num_colleges = college_prefs.len();
        validate_permutations(student_prefs, num_colleges, "学生")?;
        validate_permutations(college_prefs, num_students, "学校")?;

        let student_cost = student_prefs
            .iter()
            .map(|prefs| {
                let mut cost = vec![0; num_colleges];
                for (rank, j) in prefs.iter().enumerate() {
                    cost[*j] = rank;
                }
                cost
            })
            .collect();
        let college_score = college_prefs
            .iter()
            .map(|prefs| {
                let mut score = vec![0; num_students];
                for (rank, i) in prefs.iter().enumerate() {
                    score[*i] = num_students - rank;
                }
                score
            })
            .collect();

        Ok(Self {
            num_students,
            num_colleges,
            student_rank: student_prefs.to_vec(),
            student_cost,
            college_score
        })
    }

    pub fn from_instance(instance: &MarketInstance) -> Result<Self> {
        Self::new(&instance.student_prefs, &instance.college_prefs)
    }

    pub fn num_students(&self) -> usize {
        self.num_students
    }

    pub fn num_colleges(&self) -> usize {
        self.num_colleges
    }

    /// 学校 j 在学生 i 偏好中的名次
    pub fn rank_of(&self, student: usize, college: usize) -> usize {
        self.student_cost[student][college]
    }

    /// 学校 j 对学生 i 的打分
    pub fn score_of(&self, college: usize, student: usize) -> usize {
        self.college_score[college][student]
    }

    /// 以给定容量求学生最优稳定匹配
    pub fn run(&self, capacities: &[u32]) -> Result<MatchingOutcome> {
        if capacities.len() != self.num_colleges {
            bail!("容量长度 {} 与学校数 {} 不一致", capacities.len(), self.num_colleges);
        }
        let slots: Vec<usize> = capacities
            .iter()
            .map(|x| (*x as usize).min(self.num_students))
            .collect();

        let mut cursor = vec![0usize; self.num_students];
        let mut proposals: Vec<Vec<usize>> = vec![Vec::new(); self.num_colleges];
        let mut rounds = 0;
        let mut rejections = 0;

        loop {
            rounds += 1;
            proposals.iter_mut().for_each(|p| p.clear());
            for (i, k) in cursor.iter().enumerate() {
                if *k < self.num_colleges {
                    proposals[self.student_rank[i][*k]].push(i);
                }
            }

            let mut rejected = 0;
            for (j, proposers) in proposals.iter_mut().enumerate() {
                let keep = slots[j];
                if proposers.len() <= keep {
                    continue;
                }
                // 容量为 0 时 keep = 0，全部拒绝
                let score = &self.college_score[j];
                proposers.sort_unstable_by(|a, b| score[*b].cmp(&score[*a]));
                for i in &proposers[keep..] {
                    cursor[*i] += 1;
                    rejected += 1;
                }
            }
            rejections += rejected;
            trace!("第 {rounds} 轮: 拒绝 {rejected}");
            if rejected == 0 {
                break;
            }
        }

        let assignment: Vec<Option<usize>> = cursor
            .iter()
            .enumerate()
            .map(|(i, k)| self.student_rank[i].get(*k).copied())
            .collect();
        let total_cost = assignment
            .iter()
            .enumerate()
            .map(|(i, j)| match j {
                Some(j) => self.student_cost[i][*j],
                None => self.num_colleges
            })
            .sum::<usize>() as f64;

        Ok(MatchingOutcome {
            assignment,
            total_cost,
            rounds,
            rejections
        })
    }

    /// 只需要总代价时的简写
    pub fn cost(&self, capacities: &[u32]) -> Result<f64> {
        Ok(self.run(capacities)?.total_cost)
    }
}

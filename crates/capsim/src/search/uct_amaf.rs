//! UCT-AMAF 搜索引擎
//!
//! 在部分分配构成的有向无环图上做蒙特卡洛树搜索。规范化历史相同的状态
//! 共享一个节点，奖励除了沿选择路径回传之外，还按父节点关系逐层广播，
//! 使所有能到达叶子的祖先都得到统计。完全枚举的子树不再被随机探索，
//! 根节点完全枚举时搜索等价于穷举。
//!
//! 每次 rollout 分四步：选择、展开、模拟、回传。

use anyhow::{Result, anyhow, bail};
use hashbrown::HashMap;
use log::{debug, trace};
use rand::{SeedableRng, rngs::StdRng, seq::IndexedRandom};

use super::{SearchConfig, node::SearchNode};
use crate::expansion::AllocationState;

/// 根节点在 arena 中的下标
pub const ROOT: usize = 0;

pub struct UctAmaf<S: AllocationState> {
    /// UCB 探索系数
    exploration_weight: f64,
    /// 所有节点
    nodes: Vec<SearchNode<S>>,
    /// 规范化历史 -> 节点下标
    registry: HashMap<S::Key, usize>,
    /// 模拟中见过的最好终局
    best: Option<(f64, S)>,
    rng: StdRng
}

impl<S: AllocationState> UctAmaf<S> {
    /// 以给定状态为根创建搜索图
    pub fn new(root: S, config: &SearchConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng()
        };
        let mut registry = HashMap::new();
        registry.insert(root.key(), ROOT);
        Self {
            exploration_weight: config.exploration_weight,
            nodes: vec![SearchNode::new(root)],
            registry,
            best: None,
            rng
        }
    }

    pub fn node(&self, index: usize) -> &SearchNode<S> {
        &self.nodes[index]
    }

    pub fn root(&self) -> &SearchNode<S> {
        &self.nodes[ROOT]
    }

    /// 已创建的节点数
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 按规范化历史查找节点
    pub fn lookup(&self, key: &S::Key) -> Option<usize> {
        self.registry.get(key).copied()
    }

    pub fn is_fully_explored(&self) -> bool {
        self.nodes[ROOT].fully_explored
    }

    /// 模拟中见过的最好奖励，尚未模拟时为 -inf
    pub fn best_reward(&self) -> f64 {
        self.best.as_ref().map(|(r, _)| *r).unwrap_or(f64::NEG_INFINITY)
    }

    /// 模拟中见过的最好终局
    pub fn best_state(&self) -> Option<&S> {
        self.best.as_ref().map(|(_, s)| s)
    }

    /// 执行一次 rollout，返回本次模拟的奖励
    pub fn do_rollout(&mut self, node: usize) -> Result<f64> {
        let path = self.select(node);
        let leaf = *path.last().ok_or_else(|| anyhow!("选择路径为空"))?;
        self.expand(leaf);
        let reward = self.simulate(leaf)?;
        self.backpropagate(&path, reward);
        Ok(reward)
    }

    /// 选出节点的最佳子状态（实际决策）
    ///
    /// 未展开时随机返回一个合法子状态。
    pub fn choose(&mut self, node: usize) -> Result<S> {
        match self.best_child(node)? {
            Some(child) => Ok(self.nodes[child].state.clone()),
            None => {
                let state = &self.nodes[node].state;
                let actions = state.legal_actions();
                let action = actions
                    .choose(&mut self.rng)
                    .ok_or_else(|| anyhow!("非终局状态没有合法动作: {:?}", state.key()))?;
                Ok(state.transition(action))
            }
        }
    }

    /// 已展开节点中决策分数最高的子节点，未展开时为 None
    ///
    /// 完全枚举的子节点用子树最大奖励，其余用平均奖励，未访问的为 -inf。
    /// 分数相同时取动作顺序靠前的。
    pub fn best_child(&self, node: usize) -> Result<Option<usize>> {
        let n = &self.nodes[node];
        if n.is_terminal() {
            bail!("不能在终局节点上选择子节点: {:?}", n.state.key());
        }
        let Some(children) = &n.children else {
            return Ok(None);
        };
        let mut best = None;
        let mut best_score = f64::NEG_INFINITY;
        for &child in children {
            let score = self.nodes[child].decision_score();
            if best.is_none() || score > best_score {
                best = Some(child);
                best_score = score;
            }
        }
        Ok(best)
    }

    /// 从节点开始反复 choose 直到终局
    pub fn best_line(&mut self, node: usize) -> Result<S> {
        let mut current = node;
        loop {
            if self.nodes[current].is_terminal() {
                return Ok(self.nodes[current].state.clone());
            }
            match self.best_child(current)? {
                Some(child) => current = child,
                None => {
                    // 未展开的部分随机走完
                    let mut state = self.choose(current)?;
                    while !state.is_terminal() {
                        let actions = state.legal_actions();
                        let action = actions
                            .choose(&mut self.rng)
                            .ok_or_else(|| anyhow!("非终局状态没有合法动作: {:?}", state.key()))?;
                        state = state.transition(action);
                    }
                    return Ok(state);
                }
            }
        }
    }

    /// 选择：沿 UCB 下降，遇到未访问的子节点随机选一个后停止
    fn select(&mut self, mut node: usize) -> Vec<usize> {
        let mut path = Vec::new();
        loop {
            path.push(node);
            let n = &self.nodes[node];
            let Some(children) = &n.children else {
                return path;
            };
            if n.is_terminal() || children.is_empty() {
                return path;
            }
            let unexplored: Vec<usize> = children
                .iter()
                .copied()
                .filter(|c| self.nodes[*c].visits == 0.0)
                .collect();
            if let Some(&child) = unexplored.choose(&mut self.rng) {
                path.push(child);
                return path;
            }
            node = self.uct_select(node);
        }
    }

    /// UCB 最大的子节点，相同时取靠前的
    fn uct_select(&self, node: usize) -> usize {
        let n = &self.nodes[node];
        let ln_visits = n.visits.ln();
        let children = n.children.as_deref().unwrap_or_default();
        let mut best = children.first().copied().unwrap_or(node);
        let mut best_score = f64::NEG_INFINITY;
        for &child in children {
            let score = self.nodes[child].ucb(self.exploration_weight, ln_visits);
            if score > best_score {
                best = child;
                best_score = score;
            }
        }
        best
    }

    /// 展开：生成全部子节点，已登记的规范化历史直接复用并补一条父边
    fn expand(&mut self, node: usize) {
        if self.nodes[node].is_expanded() {
            return;
        }
        let state = self.nodes[node].state.clone();
        let mut children = Vec::new();
        for action in state.legal_actions() {
            let child_state = state.transition(&action);
            let key = child_state.key();
            let child = match self.registry.get(&key) {
                Some(&index) => index,
                None => {
                    let index = self.nodes.len();
                    self.nodes.push(SearchNode::new(child_state));
                    self.registry.insert(key, index);
                    index
                }
            };
            self.nodes[child].add_parent(node);
            if !children.contains(&child) {
                children.push(child);
            }
        }
        trace!("展开节点 #{node}: {} 个子节点", children.len());
        self.nodes[node].children = Some(children);
    }

    /// 模拟：随机走到终局并计算奖励
    fn simulate(&mut self, node: usize) -> Result<f64> {
        let mut state = self.nodes[node].state.clone();
        while !state.is_terminal() {
            let actions = state.legal_actions();
            let action = actions
                .choose(&mut self.rng)
                .ok_or_else(|| anyhow!("非终局状态没有合法动作: {:?}", state.key()))?;
            state = state.transition(action);
        }
        let reward = state.reward()?;
        if reward > self.best_reward() {
            debug!("新的最好分配 {:?}: reward = {reward:.6}", state.allocation());
            self.best = Some((reward, state));
        }
        Ok(reward)
    }

    /// 回传：先沿路径每个节点 +1，再从叶子沿父边逐层广播
    fn backpropagate(&mut self, path: &[usize], reward: f64) {
        for &index in path.iter().rev() {
            self.update_node(index, reward, 1.0);
        }
        let Some(&leaf) = path.last() else {
            return;
        };

        // 每一层的 (节点, 重数)，重数为从叶子到该节点的不同路径数
        let mut wave: Vec<(usize, f64)> = vec![(leaf, 1.0)];
        while !wave.is_empty() {
            for &(index, count) in &wave {
                self.update_node(index, reward, count);
            }
            let mut parents: HashMap<usize, f64> = HashMap::new();
            for &(index, count) in &wave {
                for &parent in &self.nodes[index].parents {
                    *parents.entry(parent).or_insert(0.0) += count;
                }
            }
            wave = parents.into_iter().collect();
            wave.sort_unstable_by_key(|(index, _)| *index);
        }
    }

    /// 累加统计并刷新完全枚举标记
    ///
    /// 终局节点只会作为 rollout 的叶子被更新，此时 reward 就是它自己的奖励。
    fn update_node(&mut self, index: usize, reward: f64, count: f64) {
        let node = &mut self.nodes[index];
        node.visits += count;
        node.reward_sum += reward * count;
        if node.fully_explored {
            return;
        }
        let Some(children) = &self.nodes[index].children else {
            return;
        };
        if children.is_empty() {
            let node = &mut self.nodes[index];
            node.fully_explored = true;
            node.best_reward = Some(reward);
            return;
        }
        let mut best = f64::NEG_INFINITY;
        for &child in children {
            let c = &self.nodes[child];
            match (c.fully_explored, c.best_reward) {
                (true, Some(r)) => best = best.max(r),
                _ => return
            }
        }
        let node = &mut self.nodes[index];
        node.fully_explored = true;
        node.best_reward = Some(best);
    }
}

//! 候选路径选取策略

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use openmis_core::{ProtocolConfig, SelectionKind};

/// 在候选路径中选取一条的策略
///
/// `choose` 的返回值必须小于 `candidates`；候选集为空时不会被调用。
pub trait SelectionPolicy: Send + Sync {
    fn choose(&mut self, candidates: usize) -> usize;
}

/// 均匀随机选取（默认策略）
pub struct UniformRandom {
    rng: StdRng,
}

impl UniformRandom {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// 以固定种子构建，可复现
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for UniformRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionPolicy for UniformRandom {
    fn choose(&mut self, candidates: usize) -> usize {
        self.rng.gen_range(0..candidates)
    }
}

/// 确定性选取：总是取第一条候选路径，用于测试和可复现运行
pub struct FirstCandidate;

impl SelectionPolicy for FirstCandidate {
    fn choose(&mut self, _candidates: usize) -> usize {
        0
    }
}

/// 按配置构建策略
pub fn policy_from_config(config: &ProtocolConfig) -> Box<dyn SelectionPolicy> {
    match config.selection {
        SelectionKind::First => Box::new(FirstCandidate),
        SelectionKind::Uniform => match config.seed {
            Some(seed) => Box::new(UniformRandom::with_seed(seed)),
            None => Box::new(UniformRandom::new()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_candidate_always_zero() {
        let mut policy = FirstCandidate;
        assert_eq!(policy.choose(1), 0);
        assert_eq!(policy.choose(17), 0);
    }

    #[test]
    fn test_uniform_stays_in_bounds() {
        let mut policy = UniformRandom::with_seed(7);
        for _ in 0..100 {
            assert!(policy.choose(5) < 5);
        }
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let mut a = UniformRandom::with_seed(42);
        let mut b = UniformRandom::with_seed(42);
        let picks_a: Vec<usize> = (0..20).map(|_| a.choose(10)).collect();
        let picks_b: Vec<usize> = (0..20).map(|_| b.choose(10)).collect();
        assert_eq!(picks_a, picks_b);
    }

    #[test]
    fn test_policy_from_config() {
        let config = ProtocolConfig::default().with_selection(SelectionKind::First);
        let mut policy = policy_from_config(&config);
        assert_eq!(policy.choose(3), 0);
    }
}

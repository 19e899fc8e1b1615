//! Per-cycle universe sampling.
//!
//! The engine scans a bounded random subset of the market universe each
//! cycle. Sampling sits behind a trait so tests can inject a deterministic
//! strategy.

use crate::domain::MarketId;
use rand::seq::SliceRandom;

/// Picks which subset of the universe to scan this cycle
pub trait Sampler: Send {
    fn sample(&mut self, universe: &[MarketId], k: usize) -> Vec<MarketId>;
}

/// Uniform random sampling without replacement
#[derive(Debug, Default)]
pub struct RandomSampler;

impl Sampler for RandomSampler {
    fn sample(&mut self, universe: &[MarketId], k: usize) -> Vec<MarketId> {
        let mut rng = rand::thread_rng();
        universe
            .choose_multiple(&mut rng, k.min(universe.len()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe() -> Vec<MarketId> {
        ["BTC-USD", "ETH-USD", "SOL-USD", "ADA-USD"]
            .iter()
            .map(|s| MarketId::from(*s))
            .collect()
    }

    #[test]
    fn test_sample_size_bounded() {
        let universe = universe();
        let mut sampler = RandomSampler;

        assert_eq!(sampler.sample(&universe, 2).len(), 2);
        // Requesting more than the universe yields the whole universe.
        assert_eq!(sampler.sample(&universe, 10).len(), universe.len());
    }

    #[test]
    fn test_sample_draws_from_universe_without_repeats() {
        let universe = universe();
        let mut sampler = RandomSampler;

        let picked = sampler.sample(&universe, 3);
        for market in &picked {
            assert!(universe.contains(market));
        }
        let mut unique = picked.clone();
        unique.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        unique.dedup();
        assert_eq!(unique.len(), picked.len());
    }
}

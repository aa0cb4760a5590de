//! Random digit sequences for cross-checking

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Configuration for random input generation
#[derive(Debug, Clone)]
pub struct RandomInputConfig {
    /// Number of digit sequences to generate
    pub count: usize,
    /// Seed for reproducible runs (None = seeded from the OS)
    pub seed: Option<u64>,
}

impl Default for RandomInputConfig {
    fn default() -> Self {
        RandomInputConfig {
            count: 256,
            seed: None,
        }
    }
}

impl RandomInputConfig {
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_seed_option(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

/// A single digit sequence of `len` digits in `1..=9`
pub fn random_digits<R: Rng>(rng: &mut R, len: usize) -> Vec<u8> {
    (0..len).map(|_| rng.random_range(1..=9)).collect()
}

/// Generate `config.count` random model numbers of `len` digits
pub fn generate_random_inputs(config: &RandomInputConfig, len: usize) -> Vec<Vec<u8>> {
    let mut rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    };
    (0..config.count)
        .map(|_| random_digits(&mut rng, len))
        .collect()
}

/// Boundary model numbers: all ones, all nines, and alternating patterns
pub fn generate_edge_case_inputs(len: usize) -> Vec<Vec<u8>> {
    let mut inputs = vec![vec![1; len], vec![9; len]];
    if len >= 2 {
        inputs.push((0..len).map(|i| if i % 2 == 0 { 1 } else { 9 }).collect());
        inputs.push((0..len).map(|i| if i % 2 == 0 { 9 } else { 1 }).collect());
        inputs.push((0..len).map(|i| (i % 9) as u8 + 1).collect());
    }
    inputs
}

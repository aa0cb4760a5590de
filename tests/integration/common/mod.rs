//! Synthetic MONAD programs with a known answer

#![allow(dead_code)]

use monad_solver::Objective;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Parameters of one 18-instruction block
#[derive(Debug, Clone, Copy)]
pub struct Block {
    pub div_z: i64,
    pub add_x: i64,
    pub add_y: i64,
}

impl Block {
    pub fn text(&self) -> String {
        format!(
            "inp w\nmul x 0\nadd x z\nmod x 26\ndiv z {}\nadd x {}\neql x w\neql x 0\n\
             mul y 0\nadd y 25\nmul y x\nadd y 1\nmul z y\nmul y 0\nadd y w\nadd y {}\n\
             mul y x\nadd z y\n",
            self.div_z, self.add_x, self.add_y
        )
    }
}

/// A MONAD program whose pop blocks pair with push blocks like brackets
#[derive(Debug, Clone)]
pub struct Monad {
    pub blocks: Vec<Block>,
    /// `(push, pop, offset)`: digit `pop` must equal digit `push` + offset
    pub pairs: Vec<(usize, usize, i64)>,
}

impl Monad {
    pub fn text(&self) -> String {
        self.blocks.iter().map(Block::text).collect()
    }

    /// Answer derived from the pairs alone
    pub fn expected(&self, objective: Objective) -> String {
        let mut digits = vec![0i64; self.blocks.len()];
        for &(push, pop, offset) in &self.pairs {
            let (a, b) = match objective {
                Objective::Max if offset >= 0 => (9 - offset, 9),
                Objective::Max => (9, 9 + offset),
                Objective::Min if offset >= 0 => (1, 1 + offset),
                Objective::Min => (1 - offset, 1),
            };
            digits[push] = a;
            digits[pop] = b;
        }
        digits.iter().map(|d| d.to_string()).collect()
    }
}

/// Random bracket structure of `pairs` push/pop pairs
pub fn generate(seed: u64, pairs: usize) -> Monad {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let len = pairs * 2;
    let mut blocks = Vec::with_capacity(len);
    let mut stack: Vec<(usize, i64)> = Vec::new();
    let mut matched = Vec::new();
    let mut pushes_left = pairs;

    for index in 0..len {
        let must_pop = pushes_left == 0;
        let can_pop = !stack.is_empty();
        if must_pop || (can_pop && rng.random_bool(0.5)) {
            let Some((push, push_y)) = stack.pop() else {
                unreachable!("pops never outnumber pushes");
            };
            let offset = rng.random_range(-8..=8);
            blocks.push(Block {
                div_z: 26,
                add_x: offset - push_y,
                add_y: rng.random_range(1..=16),
            });
            matched.push((push, index, offset));
        } else {
            let add_y = rng.random_range(1..=16);
            blocks.push(Block {
                div_z: 1,
                add_x: rng.random_range(10..=16),
                add_y,
            });
            stack.push((index, add_y));
            pushes_left -= 1;
        }
    }

    Monad {
        blocks,
        pairs: matched,
    }
}

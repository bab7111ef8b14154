//! anti-correlation randomness
//!
//! every piece of protocol randomness (per-deposit release jitter, batch
//! payout permutation) flows through one strategy object, so tests inject
//! a fixed seed and the engine stays deterministic under test while the
//! production path seeds from the os.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

pub trait ObfuscationStrategy: Send {
    /// uniform draw from [0, bound]; bound 0 yields 0
    fn release_jitter(&mut self, bound: u64) -> u64;

    /// permutation of 0..len
    fn permutation(&mut self, len: usize) -> Vec<usize>;
}

/// chacha20-backed strategy
pub struct SeededShuffle {
    rng: ChaCha20Rng,
}

impl SeededShuffle {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            rng: ChaCha20Rng::from_seed(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
        }
    }
}

impl ObfuscationStrategy for SeededShuffle {
    fn release_jitter(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.rng.gen_range(0..=bound)
    }

    fn permutation(&mut self, len: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..len).collect();
        // fisher-yates
        for i in (1..len).rev() {
            let j = (self.rng.next_u64() % (i as u64 + 1)) as usize;
            order.swap(i, j);
        }
        order
    }
}

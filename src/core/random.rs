//! Purpose: Explicit, seedable randomness for seeding runs.
//! Exports: `RandomSource`, `SeededRandom`, `ALPHABET`.
//! Role: Replaces process-wide randomness so a seed fully determines a seeding run.
//! Invariants: `below(0)` returns 0 and consumes nothing.
use crate::core::error::{Error, ErrorKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub trait RandomSource {
    /// Uniform value in `[0, upper)`.
    fn below(&mut self, upper: usize) -> usize;

    fn alphabetic(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| ALPHABET[self.below(ALPHABET.len())] as char)
            .collect()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn below(&mut self, upper: usize) -> usize {
        (**self).below(upper)
    }

    fn alphabetic(&mut self, len: usize) -> String {
        (**self).alphabetic(len)
    }
}

#[derive(Clone, Debug)]
pub struct SeededRandom {
    seed: u64,
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draws the seed from the OS so it can be logged and replayed.
    pub fn from_entropy() -> Result<Self, Error> {
        let mut bytes = [0u8; 8];
        getrandom::fill(&mut bytes).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message(format!("failed to read OS randomness: {err}"))
        })?;
        Ok(Self::new(u64::from_le_bytes(bytes)))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRandom {
    fn below(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        self.rng.gen_range(0..upper)
    }
}

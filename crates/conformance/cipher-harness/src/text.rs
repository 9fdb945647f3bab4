//! Random plaintext generation

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;

/// Produces random plaintexts over ASCII letters and digits.
///
/// The random source is injected so runs can be replayed from a seed.
#[derive(Debug, Clone)]
pub struct TextGenerator<R = StdRng> {
    rng: R,
}

impl TextGenerator<StdRng> {
    /// Reproducible generator
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> TextGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Text of exactly `len` characters
    pub fn text(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| char::from(self.rng.sample(Alphanumeric)))
            .collect()
    }

    /// Length drawn uniformly from the half-open `range`; an empty range
    /// yields `range.start`
    pub fn length_in(&mut self, range: Range<usize>) -> usize {
        if range.is_empty() {
            range.start
        } else {
            self.rng.gen_range(range)
        }
    }

    /// Text whose length is drawn from `range`
    pub fn text_in(&mut self, range: Range<usize>) -> String {
        let len = self.length_in(range);
        self.text(len)
    }
}

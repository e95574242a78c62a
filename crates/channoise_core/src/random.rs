//! Uniform variates for occurrence-time and outcome sampling.

use crate::error::{ChannelError, Result};
use rand::distributions::Open01;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Supplies uniform variates in the open interval (0, 1).
///
/// Never returning exactly 0 keeps `-ln(U)` finite.
pub trait UniformSource {
    fn uniform(&mut self) -> Result<f64>;
}

impl<R: Rng + ?Sized> UniformSource for R {
    fn uniform(&mut self) -> Result<f64> {
        Ok(self.sample(Open01))
    }
}

/// Exponential holding time `-ln(U) / rate`.
///
/// Returns `None` if the result is not a finite, non-negative duration
/// (e.g. `rate == 0`).
pub fn exponential<U: UniformSource + ?Sized>(rate: f64, source: &mut U) -> Result<Option<f64>> {
    let u = source.uniform()?;
    let holding = -u.ln() / rate;
    Ok((holding.is_finite() && holding >= 0.0).then_some(holding))
}

/// Independent ChaCha8 stream for one node.
///
/// Streams share the seed and differ by stream id, so per-node sequences do
/// not depend on the order in which nodes are visited.
#[must_use]
pub fn node_stream(seed: u64, node: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(node as u64);
    rng
}

/// Wraps a source and remembers every draw it hands out.
pub struct RecordingSource<S> {
    inner: S,
    draws: Vec<f64>,
}

impl<S: UniformSource> RecordingSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            draws: Vec::new(),
        }
    }

    #[must_use]
    pub fn draws(&self) -> &[f64] {
        &self.draws
    }

    #[must_use]
    pub fn into_draws(self) -> Vec<f64> {
        self.draws
    }
}

impl<S: UniformSource> UniformSource for RecordingSource<S> {
    fn uniform(&mut self) -> Result<f64> {
        let u = self.inner.uniform()?;
        self.draws.push(u);
        Ok(u)
    }
}

/// Replays a fixed sequence of draws.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    draws: Vec<f64>,
    cursor: usize,
}

impl ReplaySource {
    pub fn new(draws: Vec<f64>) -> Self {
        Self { draws, cursor: 0 }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.draws.len() - self.cursor
    }
}

impl UniformSource for ReplaySource {
    fn uniform(&mut self) -> Result<f64> {
        let u = self
            .draws
            .get(self.cursor)
            .copied()
            .ok_or(ChannelError::RandomStreamExhausted(self.cursor))?;
        self.cursor += 1;
        Ok(u)
    }
}

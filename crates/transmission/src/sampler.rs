//! Probabilistic sampling gate
//!
//! An event with sample rate N is admitted with probability 1/N; a rate of
//! 1 (or below) admits everything. The random source sits behind a trait so
//! tests can pin the draw and assert the exact admit/drop decision.

use std::sync::Arc;

use rand::Rng;

/// Source of uniform draws in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    /// Draw one value uniformly from `[0, 1)`
    fn uniform01(&self) -> f64;
}

/// Default source backed by the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn uniform01(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Fixed source returning the same draw every time, for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedSource(pub f64);

impl RandomSource for FixedSource {
    fn uniform01(&self) -> f64 {
        self.0
    }
}

/// The sampling gate.
#[derive(Clone)]
pub struct Sampler {
    source: Arc<dyn RandomSource>,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler {
    /// Sampler with the default random source
    pub fn new() -> Self {
        Self::with_source(Arc::new(ThreadRngSource))
    }

    /// Sampler with an injected random source
    pub fn with_source(source: Arc<dyn RandomSource>) -> Self {
        Self { source }
    }

    /// Decide whether an event with the given rate is admitted
    pub fn should_send(&self, sample_rate: u32) -> bool {
        sample_rate <= 1 || self.source.uniform01() < 1.0 / f64::from(sample_rate)
    }
}

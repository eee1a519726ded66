//! Metropolis-Hastings acceptance gate
//!
//! ```text
//! dS    = s_new - s_old
//! alpha = 1               if dS >= 0
//! alpha = exp(beta * dS)  otherwise
//! accept iff u < alpha, u ~ Uniform[0, 1)
//! ```
//!
//! `beta` is constant for the whole run. `beta = 0` accepts everything,
//! large `beta` approaches greedy hill-climbing.

use serde::{Deserialize, Serialize};

/// Source of uniform draws in `[0, 1)`
pub trait UniformSource {
    /// Next draw in `[0, 1)`
    fn uniform(&mut self) -> f64;
}

impl<R: rand::Rng + ?Sized> UniformSource for R {
    #[inline]
    fn uniform(&mut self) -> f64 {
        self.random::<f64>()
    }
}

/// Outcome of one acceptance test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// `s_new - s_old`
    pub delta: f64,
    /// Acceptance probability
    pub alpha: f64,
    /// Uniform draw the decision was made with
    pub draw: f64,
    /// Whether the proposal replaces the current candidate
    pub accepted: bool,
}

impl Decision {
    /// Absolute score movement of the proposal
    #[inline]
    #[must_use]
    pub fn movement(&self) -> f64 {
        self.delta.abs()
    }
}

/// Acceptance probability for a move from `s_old` to `s_new`
///
/// A NaN delta yields a NaN probability, which no draw satisfies.
#[inline]
#[must_use]
pub fn acceptance_probability(s_old: f64, s_new: f64, beta: f64) -> f64 {
    let delta = s_new - s_old;
    if delta >= 0.0 {
        1.0
    } else {
        (beta * delta).exp()
    }
}

/// Fixed-temperature Metropolis-Hastings gate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptanceGate {
    beta: f64,
}

impl AcceptanceGate {
    /// Create gate with inverse temperature `beta >= 0`
    #[inline]
    #[must_use]
    pub fn new(beta: f64) -> Self {
        debug_assert!(beta >= 0.0, "beta must be non-negative");
        Self { beta }
    }

    /// Inverse temperature
    #[inline]
    #[must_use]
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Decide with an explicit draw
    #[must_use]
    pub fn decide_with_draw(&self, s_old: f64, s_new: f64, draw: f64) -> Decision {
        let alpha = acceptance_probability(s_old, s_new, self.beta);
        Decision {
            delta: s_new - s_old,
            alpha,
            draw,
            accepted: draw < alpha,
        }
    }

    /// Decide, consuming exactly one draw from `source`
    pub fn decide<U: UniformSource + ?Sized>(
        &self,
        s_old: f64,
        s_new: f64,
        source: &mut U,
    ) -> Decision {
        let draw = source.uniform();
        self.decide_with_draw(s_old, s_new, draw)
    }
}

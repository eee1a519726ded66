//! Per-round convergence monitor
//!
//! Only accepted proposals contribute movement. A rejected proposal with a
//! large delta does not keep the run alive.

use crate::gate::Decision;
use serde::{Deserialize, Serialize};

/// What happened to the chains in one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    /// Round number (1-based)
    pub round: usize,
    /// Largest `|dS|` among accepted proposals
    pub max_movement: f64,
    /// Accepted proposals
    pub accepted: usize,
    /// Rejected proposals
    pub rejected: usize,
    /// Chain steps that failed and were isolated
    pub failed: usize,
    /// Whether the round satisfied the convergence test
    pub converged: bool,
}

/// Tracks the current round's maximum accepted movement
#[derive(Debug, Clone)]
pub struct ConvergenceMonitor {
    epsilon: f64,
    round: usize,
    max_movement: f64,
    accepted: usize,
    rejected: usize,
    failed: usize,
}

impl ConvergenceMonitor {
    /// Create monitor with tolerance `epsilon`
    #[inline]
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            round: 0,
            max_movement: 0.0,
            accepted: 0,
            rejected: 0,
            failed: 0,
        }
    }

    /// Reset counters for `round`
    pub fn begin_round(&mut self, round: usize) {
        self.round = round;
        self.max_movement = 0.0;
        self.accepted = 0;
        self.rejected = 0;
        self.failed = 0;
    }

    /// Fold one gate decision into the round
    pub fn observe(&mut self, decision: &Decision) {
        if decision.accepted {
            self.accepted += 1;
            self.max_movement = self.max_movement.max(decision.movement());
        } else {
            self.rejected += 1;
        }
    }

    /// Record an isolated chain failure
    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Largest accepted movement so far this round
    #[inline]
    #[must_use]
    pub fn max_movement(&self) -> f64 {
        self.max_movement
    }

    /// Whether the round has settled below `epsilon`
    ///
    /// A round where no chain completed its step never counts as converged.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.accepted + self.rejected > 0 && self.max_movement < self.epsilon
    }

    /// Summarize the round
    #[must_use]
    pub fn summary(&self) -> RoundSummary {
        RoundSummary {
            round: self.round,
            max_movement: self.max_movement,
            accepted: self.accepted,
            rejected: self.rejected,
            failed: self.failed,
            converged: self.is_converged(),
        }
    }
}

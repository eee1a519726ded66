//! Per-decision trace events
//!
//! Independent of `tracing` output: a [`TraceSink`] receives structured
//! events the caller can store, print or assert on.

use crate::convergence::RoundSummary;
use crate::gate::Decision;
use crate::types::Termination;
use serde::{Deserialize, Serialize};

/// Observable step of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// Chain created from its round-0 candidate
    Initialized {
        /// Chain index
        chain: usize,
        /// Role label
        role: String,
        /// Initial score
        score: f64,
    },
    /// Accept/reject decision for one proposal
    Decision {
        /// Round number
        round: usize,
        /// Chain index
        chain: usize,
        /// Score before the step
        old_score: f64,
        /// Score of the proposal
        new_score: f64,
        /// Gate outcome
        decision: Decision,
    },
    /// Chain step failed and the chain was isolated for this round
    StepFailed {
        /// Round number
        round: usize,
        /// Chain index
        chain: usize,
        /// Error description
        error: String,
    },
    /// All chains finished a round
    RoundCompleted {
        /// Round summary
        summary: RoundSummary,
    },
    /// Run finished
    Finished {
        /// Rounds executed
        rounds_executed: usize,
        /// Why the run stopped
        termination: Termination,
        /// Selected chain index
        best_index: usize,
        /// Selected chain score
        best_score: f64,
    },
}

/// Receiver of trace events
pub trait TraceSink: Send + Sync {
    /// Record one event
    fn record(&self, event: &TraceEvent);
}

impl<F> TraceSink for F
where
    F: Fn(&TraceEvent) + Send + Sync,
{
    fn record(&self, event: &TraceEvent) {
        self(event);
    }
}

//! Error types for MH-C2C Core
//!
//! Three layers:
//! - [`ValidationError`]: bad run parameters, raised before any oracle call
//! - [`OracleError`]: failures reported by the injected oracles
//! - [`RunError`]: what a run reports to its caller

use std::fmt;

/// Invalid run parameters
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// At least one chain is required
    #[error("num_chains must be at least 1, got {0}")]
    NoChains(i64),

    /// Round budget cannot be negative
    #[error("max_rounds must be non-negative, got {0}")]
    NegativeRounds(i64),

    /// Inverse temperature must be positive and finite
    #[error("beta must be a positive finite number, got {0}")]
    InvalidBeta(f64),

    /// Convergence tolerance must be non-negative and finite
    #[error("epsilon must be a non-negative finite number, got {0}")]
    InvalidEpsilon(f64),

    /// One role label per chain
    #[error("expected {expected} roles (one per chain), got {actual}")]
    RoleCountMismatch { expected: usize, actual: usize },
}

/// Failure reported by a proposal or scoring oracle
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// Network/timeout-class failure, worth retrying at the adapter boundary
    #[error("transient oracle failure: {0}")]
    Transient(String),

    /// Non-retriable failure
    #[error("permanent oracle failure: {0}")]
    Permanent(String),

    /// Adapter gave up after retrying transient failures
    #[error("oracle retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl OracleError {
    /// Create transient error
    #[inline]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    /// Create permanent error
    #[inline]
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent(message.into())
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Short machine-readable kind
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transient(_) => "transient",
            Self::Permanent(_) => "permanent",
            Self::RetriesExhausted { .. } => "retries_exhausted",
        }
    }
}

/// Which oracle call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OraclePhase {
    /// Round-0 generation
    Init,
    /// Critique-and-refine proposal
    Propose,
    /// Scoring of a candidate
    Score,
}

impl fmt::Display for OraclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Propose => "propose",
            Self::Score => "score",
        };
        f.write_str(name)
    }
}

/// Main run error type
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Parameters rejected before any oracle call
    #[error("invalid run parameters: {0}")]
    Validation(#[from] ValidationError),

    /// Oracle failure that aborted the run
    #[error("{phase} oracle failed in round {round} for chain {chain}: {source}")]
    Oracle {
        /// Round in which the failure happened (0 = initialization)
        round: usize,
        /// Chain index
        chain: usize,
        /// Failing call
        phase: OraclePhase,
        /// Underlying oracle error
        #[source]
        source: OracleError,
    },
}

impl RunError {
    /// Round at which the run failed, if it got past validation
    #[inline]
    #[must_use]
    pub fn round(&self) -> Option<usize> {
        match self {
            Self::Validation(_) => None,
            Self::Oracle { round, .. } => Some(*round),
        }
    }

    /// Short machine-readable kind
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Oracle { source, .. } => source.kind(),
        }
    }
}

//! MH-C2C Core - Metropolis-Hastings Critique-to-Consensus
//!
//! Drives a population of candidate solutions toward higher quality:
//! - Each chain proposes a critique-informed revision every round
//! - A Metropolis-Hastings gate accepts or rejects the revision
//! - The run stops when a round's accepted movement falls below epsilon,
//!   when the round budget is exhausted, or when a stop is requested
//! - The chain with the highest final score wins
//!
//! Generation, critique and scoring are injected through [`ProposalOracle`],
//! [`Critic`] and [`ScoringOracle`].
//!
//! # Example
//!
//! ```rust,ignore
//! use mhc2c_core::{Orchestrator, RunParameters, CritiqueRefine};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let params = RunParameters::new(3).with_max_rounds(3).with_beta(1.0).with_seed(7);
//! let orchestrator = Orchestrator::new(params, CritiqueRefine::new(critic), scorer);
//!
//! let result = orchestrator.run().await?;
//! println!("best score {} after {} rounds", result.best_score, result.rounds_executed);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod chain;
pub mod convergence;
pub mod error;
pub mod gate;
pub mod oracle;
pub mod orchestrator;
pub mod trace;
pub mod types;

// Re-exports for convenience
pub use chain::{Candidate, Chain};
pub use convergence::{ConvergenceMonitor, RoundSummary};
pub use error::{OracleError, OraclePhase, RunError, ValidationError};
pub use gate::{acceptance_probability, AcceptanceGate, Decision, UniformSource};
pub use oracle::{Critic, Critiques, CritiqueRefine, ProposalOracle, ScoringOracle};
pub use orchestrator::{run, Orchestrator, StopHandle};
pub use trace::{TraceEvent, TraceSink};
pub use types::{
    default_roles, BestEver, FailurePolicy, PeerVisibility, RunConfig, RunId, RunParameters,
    RunResult, Termination,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with MH-C2C Core
    pub use crate::{
        Critic, CritiqueRefine, OracleError, Orchestrator, ProposalOracle, RunError,
        RunParameters, RunResult, ScoringOracle, TraceEvent, TraceSink,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

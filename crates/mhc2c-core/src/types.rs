//! Core types for MH-C2C
//!
//! Defines:
//! - Run parameters and their raw (deserializable) configuration form
//! - Peer visibility and failure policies
//! - Run results

use crate::chain::Chain;
use crate::convergence::RoundSummary;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique run identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub Ulid);

impl RunId {
    /// Generate new run ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which peer texts a chain sees during a round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerVisibility {
    /// Texts captured at round start; chain steps run concurrently
    #[default]
    Snapshot,
    /// Chains stepped in index order; later chains see earlier updates
    Sequential,
}

/// What to do when a chain step fails after adapter retries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the whole run
    #[default]
    Abort,
    /// Keep the chain's last accepted state and continue
    IsolateChain,
}

/// Default role labels: `Agent 1 .. Agent n`
#[must_use]
pub fn default_roles(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("Agent {i}")).collect()
}

/// Validated, immutable parameters for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    /// Number of chains
    pub num_chains: usize,
    /// Maximum refinement rounds
    pub max_rounds: usize,
    /// Inverse temperature
    pub beta: f64,
    /// Convergence tolerance
    pub epsilon: f64,
    /// One role label per chain
    pub roles: Vec<String>,
    /// Seed for the per-chain random streams
    pub seed: u64,
    /// Peer visibility within a round
    pub peer_visibility: PeerVisibility,
    /// Chain failure handling
    pub failure_policy: FailurePolicy,
}

impl RunParameters {
    /// Parameters for `num_chains` chains with default settings
    #[must_use]
    pub fn new(num_chains: usize) -> Self {
        Self {
            num_chains,
            max_rounds: 3,
            beta: 1.0,
            epsilon: 1e-3,
            roles: default_roles(num_chains),
            seed: 42,
            peer_visibility: PeerVisibility::default(),
            failure_policy: FailurePolicy::default(),
        }
    }

    /// With max rounds
    #[inline]
    #[must_use]
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// With inverse temperature
    #[inline]
    #[must_use]
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// With convergence tolerance
    #[inline]
    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// With explicit role labels
    #[must_use]
    pub fn with_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// With RNG seed
    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// With peer visibility
    #[inline]
    #[must_use]
    pub fn with_peer_visibility(mut self, visibility: PeerVisibility) -> Self {
        self.peer_visibility = visibility;
        self
    }

    /// With failure policy
    #[inline]
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Check every constraint
    ///
    /// # Errors
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.num_chains < 1 {
            return Err(ValidationError::NoChains(
                i64::try_from(self.num_chains).unwrap_or(i64::MAX),
            ));
        }
        if !(self.beta.is_finite() && self.beta > 0.0) {
            return Err(ValidationError::InvalidBeta(self.beta));
        }
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(ValidationError::InvalidEpsilon(self.epsilon));
        }
        if self.roles.len() != self.num_chains {
            return Err(ValidationError::RoleCountMismatch {
                expected: self.num_chains,
                actual: self.roles.len(),
            });
        }
        Ok(())
    }
}

impl Default for RunParameters {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Raw run configuration as read from a file or command line
///
/// Counts are signed so that negative values are reported as validation
/// errors instead of parse failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of chains
    pub num_chains: i64,
    /// Maximum refinement rounds
    pub max_rounds: i64,
    /// Inverse temperature
    pub beta: f64,
    /// Convergence tolerance
    pub epsilon: f64,
    /// Role labels; defaults to `Agent 1 .. Agent n`
    pub roles: Option<Vec<String>>,
    /// RNG seed
    pub seed: u64,
    /// Peer visibility
    pub peer_visibility: PeerVisibility,
    /// Failure policy
    pub failure_policy: FailurePolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        let defaults = RunParameters::default();
        Self {
            num_chains: 3,
            max_rounds: 3,
            beta: defaults.beta,
            epsilon: defaults.epsilon,
            roles: None,
            seed: defaults.seed,
            peer_visibility: defaults.peer_visibility,
            failure_policy: defaults.failure_policy,
        }
    }
}

impl RunConfig {
    /// Convert into validated parameters
    ///
    /// # Errors
    /// Returns [`ValidationError`] for any out-of-range value.
    pub fn into_parameters(self) -> Result<RunParameters, ValidationError> {
        let num_chains = usize::try_from(self.num_chains)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or(ValidationError::NoChains(self.num_chains))?;
        let max_rounds = usize::try_from(self.max_rounds)
            .map_err(|_| ValidationError::NegativeRounds(self.max_rounds))?;

        let params = RunParameters {
            num_chains,
            max_rounds,
            beta: self.beta,
            epsilon: self.epsilon,
            roles: self.roles.unwrap_or_else(|| default_roles(num_chains)),
            seed: self.seed,
            peer_visibility: self.peer_visibility,
            failure_policy: self.failure_policy,
        };
        params.validate()?;
        Ok(params)
    }
}

/// Why the round loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// A round's accepted movement fell below epsilon
    Converged,
    /// Round budget used up
    Exhausted,
    /// Stop requested between rounds
    Cancelled,
}

/// Highest-scoring state observed at any point of the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestEver {
    /// Round in which the state was first held (0 = initialization)
    pub round: usize,
    /// Chain snapshot at that time
    pub chain: Chain,
}

impl BestEver {
    /// Update from the chains' current states after `round`
    pub fn observe(&mut self, chains: &[Chain], round: usize) {
        for chain in chains {
            if chain.score() > self.chain.score() {
                self.chain = chain.clone();
                self.round = round;
            }
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Text of the selected chain
    pub best_text: String,
    /// Score of the selected chain
    pub best_score: f64,
    /// Index of the selected chain
    pub best_index: usize,
    /// Role of the selected chain
    pub best_role: String,
    /// Rounds actually executed
    pub rounds_executed: usize,
    /// Whether the run stopped on the convergence test
    pub converged: bool,
    /// Why the run stopped
    pub termination: Termination,
    /// Best state seen at any time (informational)
    pub best_ever: BestEver,
    /// Final state of every chain
    pub chains: Vec<Chain>,
    /// Per-round summaries
    pub rounds: Vec<RoundSummary>,
}

//! Round orchestrator
//!
//! Drives the state machine:
//!
//! ```text
//! INIT -> ROUND(1) -> ... -> ROUND(t) -> { CONVERGED | ROUND(t+1) | EXHAUSTED | CANCELLED } -> DONE
//! ```
//!
//! Rounds never overlap. Within a round each chain proposes, scores and runs
//! the acceptance gate; the convergence test is the barrier between rounds.

use crate::chain::{best_index, chain_rng, peers_of, Candidate, Chain};
use crate::convergence::{ConvergenceMonitor, RoundSummary};
use crate::error::{OracleError, OraclePhase, RunError};
use crate::gate::{AcceptanceGate, Decision};
use crate::oracle::{ProposalOracle, ScoringOracle};
use crate::trace::{TraceEvent, TraceSink};
use crate::types::{
    BestEver, FailurePolicy, PeerVisibility, RunId, RunParameters, RunResult, Termination,
};
use futures::future::{join_all, try_join_all};
use rand::rngs::StdRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::Instrument;

/// Cooperative stop request, honoured between rounds
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Create new handle
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the run to stop before its next round
    #[inline]
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested
    #[inline]
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A completed chain step, not yet applied
#[derive(Debug)]
struct Step {
    proposal: Candidate,
    decision: Decision,
}

type StepOutcome = Result<Step, (OraclePhase, OracleError)>;

/// Multi-chain refine/accept/converge orchestrator
pub struct Orchestrator<P, S> {
    params: RunParameters,
    proposer: P,
    scorer: S,
    trace: Option<Arc<dyn TraceSink>>,
    stop: StopHandle,
}

impl<P, S> std::fmt::Debug for Orchestrator<P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("params", &self.params)
            .field("traced", &self.trace.is_some())
            .field("stopped", &self.stop.is_stopped())
            .finish_non_exhaustive()
    }
}

impl<P, S> Orchestrator<P, S>
where
    P: ProposalOracle,
    S: ScoringOracle,
{
    /// Create orchestrator for one run configuration
    #[must_use]
    pub fn new(params: RunParameters, proposer: P, scorer: S) -> Self {
        Self {
            params,
            proposer,
            scorer,
            trace: None,
            stop: StopHandle::new(),
        }
    }

    /// With trace sink receiving per-decision events
    #[must_use]
    pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace = Some(sink);
        self
    }

    /// With externally owned stop handle
    #[must_use]
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    /// Handle that stops the run between rounds
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Run parameters
    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &RunParameters {
        &self.params
    }

    /// Execute the run
    ///
    /// # Errors
    /// - [`RunError::Validation`] before any oracle call
    /// - [`RunError::Oracle`] when an oracle fails and the policy is
    ///   [`FailurePolicy::Abort`] (initialization failures always abort)
    pub async fn run(&self) -> Result<RunResult, RunError> {
        self.params.validate()?;

        let run_id = RunId::new();
        let span = tracing::info_span!(
            "mh_c2c_run",
            %run_id,
            chains = self.params.num_chains,
            max_rounds = self.params.max_rounds,
            beta = self.params.beta,
        );
        self.run_validated().instrument(span).await
    }

    async fn run_validated(&self) -> Result<RunResult, RunError> {
        let params = &self.params;
        let gate = AcceptanceGate::new(params.beta);
        let mut chains = self.initialize().await?;
        let mut streams: Vec<StdRng> = (0..params.num_chains)
            .map(|i| chain_rng(params.seed, i))
            .collect();

        let mut best_ever = BestEver {
            round: 0,
            chain: chains[best_index(&chains).unwrap_or(0)].clone(),
        };
        let mut rounds = Vec::new();
        let mut termination = Termination::Exhausted;
        let mut rounds_executed = 0;

        for round in 1..=params.max_rounds {
            if self.stop.is_stopped() {
                tracing::info!(round, "Stop requested, ending run");
                termination = Termination::Cancelled;
                break;
            }

            let summary = match params.peer_visibility {
                PeerVisibility::Snapshot => {
                    self.snapshot_round(round, &gate, &mut chains, &mut streams)
                        .await?
                }
                PeerVisibility::Sequential => {
                    self.sequential_round(round, &gate, &mut chains, &mut streams)
                        .await?
                }
            };
            rounds_executed = round;
            best_ever.observe(&chains, round);

            tracing::info!(
                round,
                max_movement = summary.max_movement,
                accepted = summary.accepted,
                rejected = summary.rejected,
                failed = summary.failed,
                "Round completed"
            );
            self.emit(|| TraceEvent::RoundCompleted {
                summary: summary.clone(),
            });

            let converged = summary.converged;
            rounds.push(summary);
            if converged {
                tracing::info!(round, epsilon = params.epsilon, "Converged");
                termination = Termination::Converged;
                break;
            }
        }

        let best = best_index(&chains).unwrap_or(0);
        let winner = &chains[best];
        tracing::info!(
            best_index = best,
            best_score = winner.score(),
            rounds_executed,
            ?termination,
            "Run finished"
        );
        self.emit(|| TraceEvent::Finished {
            rounds_executed,
            termination,
            best_index: best,
            best_score: winner.score(),
        });

        Ok(RunResult {
            best_text: winner.text().to_owned(),
            best_score: winner.score(),
            best_index: best,
            best_role: winner.role().to_owned(),
            rounds_executed,
            converged: termination == Termination::Converged,
            termination,
            best_ever,
            chains,
            rounds,
        })
    }

    /// Round 0: independent generations, scored, no gating
    async fn initialize(&self) -> Result<Vec<Chain>, RunError> {
        let chains = try_join_all(self.params.roles.iter().enumerate().map(
            |(index, role)| async move {
                let text = self.proposer.init(role).await.map_err(|source| RunError::Oracle {
                    round: 0,
                    chain: index,
                    phase: OraclePhase::Init,
                    source,
                })?;
                let score = self.scorer.score(&text).await.map_err(|source| RunError::Oracle {
                    round: 0,
                    chain: index,
                    phase: OraclePhase::Score,
                    source,
                })?;
                Ok::<_, RunError>(Chain::new(index, role.clone(), Candidate::new(text, score)))
            },
        ))
        .await?;

        for chain in &chains {
            tracing::debug!(chain = chain.index(), role = chain.role(), score = chain.score(), "Chain initialized");
            self.emit(|| TraceEvent::Initialized {
                chain: chain.index(),
                role: chain.role().to_owned(),
                score: chain.score(),
            });
        }
        Ok(chains)
    }

    /// All chains see the texts as of round start; steps run concurrently
    async fn snapshot_round(
        &self,
        round: usize,
        gate: &AcceptanceGate,
        chains: &mut [Chain],
        streams: &mut [StdRng],
    ) -> Result<RoundSummary, RunError> {
        let texts: Vec<String> = chains.iter().map(|c| c.text().to_owned()).collect();

        let outcomes = join_all(chains.iter().zip(streams.iter_mut()).map(|(chain, rng)| {
            let peers = peers_of(&texts, chain.index());
            self.step(chain.candidate(), peers, gate, rng)
        }))
        .await;

        let mut monitor = ConvergenceMonitor::new(self.params.epsilon);
        monitor.begin_round(round);
        for (chain, outcome) in chains.iter_mut().zip(outcomes) {
            self.apply(round, chain, outcome, &mut monitor)?;
        }
        Ok(monitor.summary())
    }

    /// Chains stepped in index order, each seeing earlier updates this round
    async fn sequential_round(
        &self,
        round: usize,
        gate: &AcceptanceGate,
        chains: &mut [Chain],
        streams: &mut [StdRng],
    ) -> Result<RoundSummary, RunError> {
        let mut monitor = ConvergenceMonitor::new(self.params.epsilon);
        monitor.begin_round(round);

        for index in 0..chains.len() {
            let texts: Vec<String> = chains.iter().map(|c| c.text().to_owned()).collect();
            let peers = peers_of(&texts, index);
            let current = chains[index].candidate().clone();
            let outcome = self.step(&current, peers, gate, &mut streams[index]).await;
            self.apply(round, &mut chains[index], outcome, &mut monitor)?;
        }
        Ok(monitor.summary())
    }

    /// Propose, score, gate. Draws from `rng` only when both calls succeed.
    async fn step(
        &self,
        current: &Candidate,
        peers: Vec<String>,
        gate: &AcceptanceGate,
        rng: &mut StdRng,
    ) -> StepOutcome {
        let text = self
            .proposer
            .critique_and_refine(&current.text, &peers)
            .await
            .map_err(|e| (OraclePhase::Propose, e))?;
        let score = self
            .scorer
            .score(&text)
            .await
            .map_err(|e| (OraclePhase::Score, e))?;
        let decision = gate.decide(current.score, score, rng);
        Ok(Step {
            proposal: Candidate::new(text, score),
            decision,
        })
    }

    /// Single writer for `chain` in `round`
    fn apply(
        &self,
        round: usize,
        chain: &mut Chain,
        outcome: StepOutcome,
        monitor: &mut ConvergenceMonitor,
    ) -> Result<(), RunError> {
        match outcome {
            Ok(step) => {
                let old_score = chain.score();
                let new_score = step.proposal.score;
                let decision = step.decision;
                tracing::debug!(
                    round,
                    chain = chain.index(),
                    delta = decision.delta,
                    alpha = decision.alpha,
                    accepted = decision.accepted,
                    "Proposal {}",
                    if decision.accepted { "accepted" } else { "rejected" }
                );
                if decision.accepted {
                    chain.replace(step.proposal);
                }
                monitor.observe(&decision);
                self.emit(|| TraceEvent::Decision {
                    round,
                    chain: chain.index(),
                    old_score,
                    new_score,
                    decision,
                });
                Ok(())
            }
            Err((phase, source)) => match self.params.failure_policy {
                FailurePolicy::Abort => {
                    tracing::error!(round, chain = chain.index(), %phase, error = %source, "Oracle failure, aborting run");
                    Err(RunError::Oracle {
                        round,
                        chain: chain.index(),
                        phase,
                        source,
                    })
                }
                FailurePolicy::IsolateChain => {
                    tracing::warn!(round, chain = chain.index(), %phase, error = %source, "Oracle failure, chain keeps last state");
                    monitor.record_failure();
                    self.emit(|| TraceEvent::StepFailed {
                        round,
                        chain: chain.index(),
                        error: source.to_string(),
                    });
                    Ok(())
                }
            },
        }
    }

    fn emit(&self, event: impl FnOnce() -> TraceEvent) {
        if let Some(sink) = &self.trace {
            sink.record(&event());
        }
    }
}

/// Run with default wiring: no trace sink, no external stop handle
///
/// # Errors
/// See [`Orchestrator::run`].
pub async fn run<P, S>(params: RunParameters, proposer: P, scorer: S) -> Result<RunResult, RunError>
where
    P: ProposalOracle,
    S: ScoringOracle,
{
    Orchestrator::new(params, proposer, scorer).run().await
}

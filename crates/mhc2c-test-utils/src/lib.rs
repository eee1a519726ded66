//! Testing utilities for MH-C2C workspace
//!
//! Deterministic stub oracles with call counters, and a collecting trace sink.

#![allow(missing_docs)]

use async_trait::async_trait;
use mhc2c_core::{OracleError, ProposalOracle, ScoringOracle, TraceEvent, TraceSink};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type InitFn = dyn Fn(&str) -> Result<String, OracleError> + Send + Sync;
type RefineFn = dyn Fn(&str, &[String]) -> Result<String, OracleError> + Send + Sync;
type ScoreFn = dyn Fn(&str) -> Result<f64, OracleError> + Send + Sync;

/// Shared call counter
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Proposal oracle driven by plain closures
pub struct StubProposer {
    init: Box<InitFn>,
    refine: Box<RefineFn>,
    pub init_calls: CallCounter,
    pub propose_calls: CallCounter,
    peer_log: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

impl StubProposer {
    pub fn new<I, R>(init: I, refine: R) -> Self
    where
        I: Fn(&str) -> Result<String, OracleError> + Send + Sync + 'static,
        R: Fn(&str, &[String]) -> Result<String, OracleError> + Send + Sync + 'static,
    {
        Self {
            init: Box::new(init),
            refine: Box::new(refine),
            init_calls: CallCounter::default(),
            propose_calls: CallCounter::default(),
            peer_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Initial text for `role`, falling back to the role label itself
    fn lookup(texts: &[(String, String)], role: &str) -> String {
        texts
            .iter()
            .find(|(r, _)| r == role)
            .map_or_else(|| role.to_string(), |(_, t)| t.clone())
    }

    /// Refinement that returns the text unchanged
    pub fn identity(texts: &[(&str, &str)]) -> Self {
        let texts = owned(texts);
        Self::new(
            move |role| Ok(Self::lookup(&texts, role)),
            |text, _| Ok(text.to_string()),
        )
    }

    /// Refinement that drops exactly one trailing character
    pub fn trim_one_char(texts: &[(&str, &str)]) -> Self {
        let texts = owned(texts);
        Self::new(
            move |role| Ok(Self::lookup(&texts, role)),
            |text, _| {
                let mut next = text.to_string();
                next.pop();
                Ok(next)
            },
        )
    }

    /// Refinement that appends `suffix`
    pub fn append(texts: &[(&str, &str)], suffix: &'static str) -> Self {
        let texts = owned(texts);
        Self::new(
            move |role| Ok(Self::lookup(&texts, role)),
            move |text, _| Ok(format!("{text}{suffix}")),
        )
    }

    /// Every `(text, peers)` pair the refinement saw, in call order
    pub fn peer_log(&self) -> Vec<(String, Vec<String>)> {
        self.peer_log.lock().clone()
    }
}

fn owned(texts: &[(&str, &str)]) -> Vec<(String, String)> {
    texts
        .iter()
        .map(|(r, t)| ((*r).to_string(), (*t).to_string()))
        .collect()
}

#[async_trait]
impl ProposalOracle for StubProposer {
    async fn init(&self, role: &str) -> Result<String, OracleError> {
        self.init_calls.bump();
        (self.init)(role)
    }

    async fn critique_and_refine(
        &self,
        text: &str,
        peers: &[String],
    ) -> Result<String, OracleError> {
        self.propose_calls.bump();
        self.peer_log.lock().push((text.to_string(), peers.to_vec()));
        (self.refine)(text, peers)
    }
}

/// Scoring oracle driven by a closure
pub struct StubScorer {
    score: Box<ScoreFn>,
    pub calls: CallCounter,
}

impl StubScorer {
    pub fn new<F>(score: F) -> Self
    where
        F: Fn(&str) -> Result<f64, OracleError> + Send + Sync + 'static,
    {
        Self {
            score: Box::new(score),
            calls: CallCounter::default(),
        }
    }

    /// `score(text) = -len(text)` in characters
    pub fn negative_length() -> Self {
        Self::new(|text| Ok(-(text.chars().count() as f64)))
    }

    /// Returns `-1, -2, -3, ...` regardless of input
    pub fn decreasing() -> Self {
        let next = AtomicUsize::new(0);
        Self::new(move |_| Ok(-((next.fetch_add(1, Ordering::SeqCst) + 1) as f64)))
    }

    /// Same score for everything
    pub fn constant(value: f64) -> Self {
        Self::new(move |_| Ok(value))
    }
}

#[async_trait]
impl ScoringOracle for StubScorer {
    async fn score(&self, text: &str) -> Result<f64, OracleError> {
        self.calls.bump();
        (self.score)(text)
    }
}

/// Trace sink that keeps every event
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<TraceEvent>>,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    /// Decision events only, as `(round, chain, accepted)`
    pub fn decisions(&self) -> Vec<(usize, usize, bool)> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                TraceEvent::Decision {
                    round,
                    chain,
                    decision,
                    ..
                } => Some((*round, *chain, decision.accepted)),
                _ => None,
            })
            .collect()
    }
}

impl TraceSink for CollectingSink {
    fn record(&self, event: &TraceEvent) {
        self.events.lock().push(event.clone());
    }
}

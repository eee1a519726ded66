//! LLM critic wired through the core orchestrator with a scripted chat model.

use async_trait::async_trait;
use mhc2c_core::{CritiqueRefine, OracleError, Orchestrator, RunParameters, Termination};
use mhc2c_oracle::{domain_roles, Brevity, ChatModel, LlmCritic, RetryPolicy, Retrying};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

/// Answers by prompt shape; every `fail_every`-th call fails transiently
struct ScriptedModel {
    prompts: Mutex<Vec<String>>,
    fail_every: usize,
}

impl ScriptedModel {
    fn new(fail_every: usize) -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(Vec::new()),
            fail_every,
        })
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, prompt: &str, _system: Option<&str>) -> Result<String, OracleError> {
        let n = {
            let mut prompts = self.prompts.lock();
            prompts.push(prompt.to_string());
            prompts.len()
        };
        if self.fail_every > 0 && n % self.fail_every == 0 {
            return Err(OracleError::transient("rate limited"));
        }

        let reply = if let Some(rest) = prompt.strip_prefix("You are ") {
            let role = rest.split('.').next().unwrap_or_default();
            format!("A rather long first answer written by {role}")
        } else if prompt.starts_with("Here is your answer") {
            "Too wordy.".to_string()
        } else if prompt.starts_with("Candidate answer") {
            "Peers are shorter.".to_string()
        } else {
            "Concise.".to_string()
        };
        Ok(reply)
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3).with_backoff(Duration::ZERO, Duration::ZERO)
}

#[tokio::test]
async fn critique_loop_converges_on_refined_answer() {
    let model = ScriptedModel::new(0);
    let critic = LlmCritic::new(model.clone(), "Explain why the sky is blue.");
    let params = RunParameters::new(3)
        .with_roles(domain_roles("science", 3))
        .with_max_rounds(5)
        .with_epsilon(0.5);

    let result = Orchestrator::new(params, CritiqueRefine::new(critic), Brevity)
        .run()
        .await
        .unwrap();

    assert_eq!(result.best_text, "Concise.");
    assert_eq!(result.best_index, 0);
    assert!(result.best_role.starts_with("Experimental Designer"));
    assert_eq!(result.rounds_executed, 2);
    assert_eq!(result.termination, Termination::Converged);

    // 3 inits, then 3 calls per chain per round
    assert_eq!(model.prompts.lock().len(), 3 + 2 * 3 * 3);
}

#[tokio::test]
async fn mutual_critique_sees_peer_answers() {
    let model = ScriptedModel::new(0);
    let critic = LlmCritic::new(model.clone(), "task");
    let params = RunParameters::new(2)
        .with_roles(["Alice", "Bob"])
        .with_max_rounds(1);

    Orchestrator::new(params, CritiqueRefine::new(critic), Brevity)
        .run()
        .await
        .unwrap();

    let prompts = model.prompts.lock();
    let mutual: Vec<&String> = prompts
        .iter()
        .filter(|p| p.starts_with("Candidate answer"))
        .collect();
    assert_eq!(mutual.len(), 2);
    assert!(mutual
        .iter()
        .any(|p| p.contains("written by Alice") && p.contains("Peer answers:\nA rather long first answer written by Bob")));
}

#[tokio::test]
async fn transient_chat_failures_are_absorbed_by_retry() {
    let model = ScriptedModel::new(4);
    let critic = LlmCritic::new(Retrying::new(model.clone(), fast_retry()), "task");
    let params = RunParameters::new(2).with_max_rounds(2).with_epsilon(0.5);

    let result = Orchestrator::new(params, CritiqueRefine::new(critic), Brevity)
        .run()
        .await
        .unwrap();

    assert_eq!(result.best_text, "Concise.");
    assert!(result.rounds.iter().all(|r| r.failed == 0));
}

#[tokio::test]
async fn exhausted_retries_abort_the_run() {
    let model = ScriptedModel::new(1);
    let critic = LlmCritic::new(Retrying::new(model.clone(), fast_retry()), "task");

    let err = Orchestrator::new(RunParameters::new(1), CritiqueRefine::new(critic), Brevity)
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.round(), Some(0));
    assert_eq!(err.kind(), "retries_exhausted");
    assert_eq!(model.prompts.lock().len(), 3);
}

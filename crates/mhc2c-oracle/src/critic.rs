//! LLM-backed critic
//!
//! Renders the four prompts of a critique-to-consensus round around a fixed
//! task statement and sends them to a [`ChatModel`].

use crate::chat::ChatModel;
use async_trait::async_trait;
use mhc2c_core::{Critic, Critiques, OracleError};
use tracing::debug;

/// Separator between peer answers in the mutual-critique prompt
pub const PEER_SEPARATOR: &str = "\n---\n";

/// Round-0 generation prompt
#[must_use]
pub fn init_prompt(role: &str, task: &str) -> String {
    format!("You are {role}. Solve the problem below as best you can.\n\n{task}\n\nAnswer:")
}

/// Self-critique prompt
#[must_use]
pub fn self_critique_prompt(answer: &str) -> String {
    format!(
        "Here is your answer:\n\n{answer}\n\n\
         Task: List two specific weaknesses or potential errors and roast this answer."
    )
}

/// Mutual-critique prompt
#[must_use]
pub fn mutual_critique_prompt(answer: &str, peers: &[String]) -> String {
    let peers = if peers.is_empty() {
        "(none)".to_string()
    } else {
        peers.join(PEER_SEPARATOR)
    };
    format!(
        "Candidate answer:\n\n{answer}\n\nPeer answers:\n{peers}\n\n\
         Task: As an outside expert, identify two flaws in the candidate above."
    )
}

/// Refinement prompt
#[must_use]
pub fn refine_prompt(task: &str, answer: &str, critiques: &Critiques) -> String {
    format!(
        "Problem:\n{task}\n\nOriginal answer:\n{answer}\n\n\
         Self-critique:\n{}\n\nPeer critique:\n{}\n\n\
         Task: Rewrite the answer, fully addressing every issue mentioned above.",
        critiques.own, critiques.peer
    )
}

/// [`Critic`] over a chat model, bound to one task
#[derive(Debug, Clone)]
pub struct LlmCritic<M> {
    model: M,
    task: String,
    system: Option<String>,
}

impl<M: ChatModel> LlmCritic<M> {
    #[must_use]
    pub fn new(model: M, task: impl Into<String>) -> Self {
        Self {
            model,
            task: task.into(),
            system: None,
        }
    }

    /// With a system message sent on every call
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    #[must_use]
    pub fn task(&self) -> &str {
        &self.task
    }

    async fn ask(&self, step: &'static str, prompt: String) -> Result<String, OracleError> {
        debug!(step, model = self.model.model_name(), "Critic call");
        self.model.complete(&prompt, self.system.as_deref()).await
    }
}

#[async_trait]
impl<M: ChatModel> Critic for LlmCritic<M> {
    async fn generate(&self, role: &str) -> Result<String, OracleError> {
        self.ask("generate", init_prompt(role, &self.task)).await
    }

    async fn self_critique(&self, text: &str) -> Result<String, OracleError> {
        self.ask("self_critique", self_critique_prompt(text)).await
    }

    async fn mutual_critique(&self, text: &str, peers: &[String]) -> Result<String, OracleError> {
        self.ask("mutual_critique", mutual_critique_prompt(text, peers))
            .await
    }

    async fn refine(&self, text: &str, critiques: &Critiques) -> Result<String, OracleError> {
        self.ask("refine", refine_prompt(&self.task, text, critiques))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Scripted {
        prompts: Mutex<Vec<(String, Option<String>)>>,
    }

    #[async_trait]
    impl ChatModel for Scripted {
        async fn complete(
            &self,
            prompt: &str,
            system: Option<&str>,
        ) -> Result<String, OracleError> {
            let mut prompts = self.prompts.lock();
            prompts.push((prompt.to_string(), system.map(str::to_string)));
            Ok(format!("reply {}", prompts.len()))
        }
    }

    #[test]
    fn init_prompt_names_role_and_task() {
        let prompt = init_prompt("Logician", "What is 2 + 2?");
        assert!(prompt.starts_with("You are Logician."));
        assert!(prompt.contains("What is 2 + 2?"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn mutual_prompt_joins_peers() {
        let prompt = mutual_critique_prompt("mine", &["a".to_string(), "b".to_string()]);
        assert!(prompt.contains("a\n---\nb"));
        assert!(mutual_critique_prompt("mine", &[]).contains("(none)"));
    }

    #[tokio::test]
    async fn refine_carries_task_and_both_critiques() {
        let critic = LlmCritic::new(Scripted::default(), "Explain tides").with_system("Be brief");
        let critiques = Critiques {
            own: "vague".to_string(),
            peer: "ignores the sun".to_string(),
        };

        let reply = critic.refine("the moon pulls", &critiques).await.unwrap();

        assert_eq!(reply, "reply 1");
        let prompts = critic.model.prompts.lock();
        let (prompt, system) = &prompts[0];
        assert!(prompt.contains("Explain tides"));
        assert!(prompt.contains("the moon pulls"));
        assert!(prompt.contains("vague"));
        assert!(prompt.contains("ignores the sun"));
        assert_eq!(system.as_deref(), Some("Be brief"));
    }
}

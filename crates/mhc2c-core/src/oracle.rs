//! Oracle interfaces
//!
//! The core never generates, critiques or scores text itself. It drives:
//! - [`ScoringOracle`]: candidate -> real score, higher is better
//! - [`ProposalOracle`]: round-0 generation and critique-informed revision
//!
//! [`CritiqueRefine`] builds a [`ProposalOracle`] out of the three steps of a
//! [`Critic`]: self-critique, mutual critique against peers, refinement.

use crate::error::OracleError;
use async_trait::async_trait;
use std::sync::Arc;

/// Maps a candidate to a quality score
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    /// Score `text`
    async fn score(&self, text: &str) -> Result<f64, OracleError>;
}

/// Produces candidates and revisions
#[async_trait]
pub trait ProposalOracle: Send + Sync {
    /// Initial candidate for `role`
    async fn init(&self, role: &str) -> Result<String, OracleError>;

    /// Revision of `text` informed by critiques against `peers`
    async fn critique_and_refine(&self, text: &str, peers: &[String])
        -> Result<String, OracleError>;
}

/// The two critiques a refinement must address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Critiques {
    /// Self-critique
    pub own: String,
    /// Critique against peer candidates
    pub peer: String,
}

/// Generation and critique capability behind [`CritiqueRefine`]
#[async_trait]
pub trait Critic: Send + Sync {
    /// Initial candidate for `role`
    async fn generate(&self, role: &str) -> Result<String, OracleError>;

    /// Weaknesses of `text` on its own
    async fn self_critique(&self, text: &str) -> Result<String, OracleError>;

    /// Flaws of `text` judged against `peers`
    async fn mutual_critique(&self, text: &str, peers: &[String]) -> Result<String, OracleError>;

    /// Rewrite of `text` addressing both critiques
    async fn refine(&self, text: &str, critiques: &Critiques) -> Result<String, OracleError>;
}

/// [`ProposalOracle`] composed from a [`Critic`]
#[derive(Debug, Clone)]
pub struct CritiqueRefine<C> {
    critic: C,
}

impl<C: Critic> CritiqueRefine<C> {
    /// Wrap a critic
    #[inline]
    #[must_use]
    pub fn new(critic: C) -> Self {
        Self { critic }
    }

    /// Underlying critic
    #[inline]
    #[must_use]
    pub fn critic(&self) -> &C {
        &self.critic
    }
}

#[async_trait]
impl<C: Critic> ProposalOracle for CritiqueRefine<C> {
    async fn init(&self, role: &str) -> Result<String, OracleError> {
        self.critic.generate(role).await
    }

    async fn critique_and_refine(
        &self,
        text: &str,
        peers: &[String],
    ) -> Result<String, OracleError> {
        let own = self.critic.self_critique(text).await?;
        let peer = self.critic.mutual_critique(text, peers).await?;
        self.critic.refine(text, &Critiques { own, peer }).await
    }
}

#[async_trait]
impl<T: ScoringOracle + ?Sized> ScoringOracle for Arc<T> {
    async fn score(&self, text: &str) -> Result<f64, OracleError> {
        (**self).score(text).await
    }
}

#[async_trait]
impl<T: ProposalOracle + ?Sized> ProposalOracle for Arc<T> {
    async fn init(&self, role: &str) -> Result<String, OracleError> {
        (**self).init(role).await
    }

    async fn critique_and_refine(
        &self,
        text: &str,
        peers: &[String],
    ) -> Result<String, OracleError> {
        (**self).critique_and_refine(text, peers).await
    }
}

#[async_trait]
impl<T: Critic + ?Sized> Critic for Arc<T> {
    async fn generate(&self, role: &str) -> Result<String, OracleError> {
        (**self).generate(role).await
    }

    async fn self_critique(&self, text: &str) -> Result<String, OracleError> {
        (**self).self_critique(text).await
    }

    async fn mutual_critique(&self, text: &str, peers: &[String]) -> Result<String, OracleError> {
        (**self).mutual_critique(text, peers).await
    }

    async fn refine(&self, text: &str, critiques: &Critiques) -> Result<String, OracleError> {
        (**self).refine(text, critiques).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingCritic {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingCritic {
        fn log(&self, entry: String) {
            self.calls.lock().unwrap().push(entry);
        }
    }

    #[async_trait]
    impl Critic for RecordingCritic {
        async fn generate(&self, role: &str) -> Result<String, OracleError> {
            self.log(format!("generate:{role}"));
            Ok(format!("draft by {role}"))
        }

        async fn self_critique(&self, text: &str) -> Result<String, OracleError> {
            self.log(format!("self:{text}"));
            Ok("too long".to_string())
        }

        async fn mutual_critique(
            &self,
            text: &str,
            peers: &[String],
        ) -> Result<String, OracleError> {
            self.log(format!("mutual:{text}:{}", peers.join("|")));
            Ok("misses peer point".to_string())
        }

        async fn refine(&self, text: &str, critiques: &Critiques) -> Result<String, OracleError> {
            self.log(format!("refine:{text}"));
            Ok(format!("{text} [{}; {}]", critiques.own, critiques.peer))
        }
    }

    #[tokio::test]
    async fn composite_runs_three_steps_in_order() {
        let oracle = CritiqueRefine::new(RecordingCritic::default());

        let revised = oracle
            .critique_and_refine("answer", &["peer a".to_string(), "peer b".to_string()])
            .await
            .unwrap();

        assert_eq!(revised, "answer [too long; misses peer point]");
        let calls = oracle.critic().calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                "self:answer".to_string(),
                "mutual:answer:peer a|peer b".to_string(),
                "refine:answer".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn init_delegates_to_generate() {
        let oracle = Arc::new(CritiqueRefine::new(RecordingCritic::default()));
        assert_eq!(oracle.init("Agent 1").await.unwrap(), "draft by Agent 1");
    }
}

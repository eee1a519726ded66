//! Chain state
//!
//! A chain is one lineage of an evolving candidate. Its text and score are
//! stored together in a [`Candidate`] and only ever replaced as a pair.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// A scored candidate solution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Opaque candidate content
    pub text: String,
    /// Oracle score of `text`
    pub score: f64,
}

impl Candidate {
    /// Create new candidate
    #[inline]
    #[must_use]
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

/// One chain's current state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    index: usize,
    role: String,
    current: Candidate,
}

impl Chain {
    /// Create chain from its round-0 candidate
    #[inline]
    #[must_use]
    pub fn new(index: usize, role: impl Into<String>, initial: Candidate) -> Self {
        Self {
            index,
            role: role.into(),
            current: initial,
        }
    }

    /// Slot index
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Role label
    #[inline]
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Current text
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.current.text
    }

    /// Current score
    #[inline]
    #[must_use]
    pub fn score(&self) -> f64 {
        self.current.score
    }

    /// Current candidate
    #[inline]
    #[must_use]
    pub fn candidate(&self) -> &Candidate {
        &self.current
    }

    /// Replace the current candidate, returning the previous one
    pub(crate) fn replace(&mut self, next: Candidate) -> Candidate {
        std::mem::replace(&mut self.current, next)
    }
}

/// Texts of every chain except `index`, in index order
#[must_use]
pub fn peers_of(texts: &[String], index: usize) -> Vec<String> {
    texts
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != index)
        .map(|(_, text)| text.clone())
        .collect()
}

/// Independent random stream for one chain
///
/// Derived from the run seed and chain index only, so the draws a chain sees
/// do not depend on how chain steps are scheduled within a round.
#[must_use]
pub fn chain_rng(seed: u64, index: usize) -> StdRng {
    let stream = (index as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    StdRng::seed_from_u64(seed ^ stream)
}

/// Index of the highest-scoring chain; ties go to the lowest index
///
/// NaN scores never win against a comparable score.
#[must_use]
pub fn best_index(chains: &[Chain]) -> Option<usize> {
    let mut best: Option<&Chain> = None;
    for chain in chains {
        best = match best {
            None => Some(chain),
            Some(current) => {
                let better = chain.score() > current.score()
                    || (current.score().is_nan() && !chain.score().is_nan());
                if better {
                    Some(chain)
                } else {
                    Some(current)
                }
            }
        };
    }
    best.map(Chain::index)
}

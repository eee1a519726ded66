//! MH-C2C Oracles
//!
//! Concrete implementations of the core's oracle seams:
//! - [`LlmCritic`] over any [`ChatModel`], with [`OpenAiChat`] for
//!   OpenAI-compatible endpoints
//! - [`Retrying`] adds exponential backoff for transient failures
//! - Heuristic [`scoring`] oracles
//! - [`domain_roles`] for role labels

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod chat;
pub mod critic;
pub mod openai;
pub mod retry;
pub mod roles;
pub mod scoring;

pub use chat::ChatModel;
pub use critic::LlmCritic;
pub use openai::{ConfigError, LlmConfig, OpenAiChat};
pub use retry::{RetryPolicy, Retrying};
pub use roles::{domain_roles, known_domains};
pub use scoring::{Brevity, Complexity, Composite, Factuality, Readability, WordOverlap};

//! Chat completion seam

use async_trait::async_trait;
use mhc2c_core::OracleError;
use std::sync::Arc;

/// A text-in, text-out language model
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete `prompt`, optionally under a system message
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String, OracleError>;

    /// Model identifier for logging
    fn model_name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl<T: ChatModel + ?Sized> ChatModel for Arc<T> {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String, OracleError> {
        (**self).complete(prompt, system).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

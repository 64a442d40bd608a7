//! The generation contract shared by the live router and the test double.

use async_trait::async_trait;
use mediagen_core::{GenerationKind, GenerationRequest, RequestContext};
use mediagen_providers::Generation;

use crate::error::GenerationError;

/// Produces one artifact per request.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Model identifier that would serve requests of `kind`.
    fn model(&self, kind: GenerationKind) -> &str;

    /// Generate the artifact described by `request`.
    async fn generate(
        &self,
        request: &GenerationRequest,
        context: &RequestContext,
    ) -> Result<Generation, GenerationError>;
}

use mediagen_providers::ProviderError;

/// Errors surfaced by a [`Generator`](crate::Generator).
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Any adapter-level failure, passed through unchanged.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Missing credential or unusable provider setup.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

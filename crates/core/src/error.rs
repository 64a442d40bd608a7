/// Errors raised while interpreting a work item.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The work item's kind tag is not one this worker serves.
    #[error("Unknown generation kind: {0}")]
    UnknownKind(String),

    /// The parameter bag is malformed or fails validation.
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CoreError::Validation(errors.to_string())
    }
}

use thiserror::Error;

/// Failures of record operations. The `Display` text of the client-facing
/// variants is sent verbatim as the `message` of a 400 response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Received data is not properly formatted.")]
    Malformed,
    #[error("Received data does not contain 'name' key.")]
    MissingName,
    #[error("Received data contain empty 'name' key.")]
    EmptyName,
    #[error("Key 'name' cannot be empty.")]
    EmptyNamePatch,
    #[error("Record containing the requested name already exists in database.")]
    AlreadyExists,
    #[error("Record containing the requested name does not exist in database.")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(String),
}

impl ServiceError {
    pub fn storage(e: impl std::fmt::Display) -> Self { Self::Storage(e.to_string()) }

    /// Everything except persistence failures is the caller's fault.
    pub fn is_client_error(&self) -> bool { !matches!(self, Self::Storage(_)) }
}

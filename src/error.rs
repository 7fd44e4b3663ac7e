use thiserror::Error;

/// Failure to turn a free-text query into a `ParsedQuery`.
///
/// Never crosses `QueryInterpreter::parse`; callers of `interpret` decide
/// how to surface it.
#[derive(Debug, Error)]
pub enum InterpretError {
    /// Network failure, timeout, non-2xx status or unusable provider config.
    #[error("LLM provider unavailable: {0}")]
    Unavailable(String),
    /// Reply body was not JSON or did not follow the requested shape.
    #[error("malformed LLM response: {0}")]
    Malformed(String),
    /// Provider answered without any choices or content.
    #[error("LLM provider returned an empty response")]
    Empty,
}

/// Errors from the user store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode store response: {0}")]
    Decode(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("insert into {0} returned no rows")]
    EmptyInsert(&'static str),
}

/// Registration payload rejected before anything was written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("field '{0}' is required")]
    MissingField(&'static str),
    #[error("description must contain at least {min} characters")]
    AboutTooShort { min: usize },
    #[error("unknown purpose: {0}")]
    UnknownPurpose(String),
    #[error("details for '{details}' do not match purpose '{purpose}'")]
    PurposeMismatch {
        purpose: String,
        details: &'static str,
    },
}

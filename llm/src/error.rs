use thiserror::Error;

#[derive(Debug, Error)]
pub enum LLMError {
    #[error("invalid server url: {0}")]
    InvalidUrl(String),
    #[error("network error: {0}")]
    Network(String),
}

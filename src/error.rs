#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("secure hash does not match the signed fields")]
    SignatureMismatch,
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("{0}")]
    Params(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type VnpayResult<T> = std::result::Result<T, Error>;

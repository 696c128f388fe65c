use thiserror::Error;

#[derive(Error, Debug)]
pub enum StubError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// The persisted stub stream cannot be trusted; discard it and rebuild.
    #[error("Corrupt stub index: {0}")]
    CorruptIndex(String),
    /// A reparsed file no longer matches the stub tree it should back.
    #[error("Stale stub: {0}")]
    StaleStub(String),
    #[error("Parsing error: {0}")]
    Parse(String),
    #[error("Invalid stub tree: {0}")]
    InvalidTree(String),
}

impl StubError {
    pub fn corrupt(msg: impl Into<String>) -> Self {
        StubError::CorruptIndex(msg.into())
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, StubError::CorruptIndex(_))
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for StubError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        StubError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StubError>;

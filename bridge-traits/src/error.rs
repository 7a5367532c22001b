use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Statement preparation failed: {0}")]
    PrepareFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

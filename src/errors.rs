use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Payload encoding/decoding failures, kept separate so they can be absorbed
/// with a single `#[from]` conversion.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("failed to encode payload: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

/// Errors raised by content store collaborators.
///
/// `NotFound` and `ConstraintViolation` are the two conditions the copy
/// protocol treats as benign during an import; everything else propagates.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("node not found: {0}")]
    NotFound(String),

    #[error("constraint violation at {path}: {reason}")]
    ConstraintViolation { path: String, reason: String },

    #[error("workspace does not exist: {0}")]
    UnknownWorkspace(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("payload codec error: {0}")]
    Codec(#[from] CodecError),

    #[cfg(feature = "sled")]
    #[error("sled backend error: {0}")]
    Sled(#[from] sled::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Errors raised by the migration driver itself.
#[derive(Error, Debug)]
pub enum MigrateError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid migration config: {0}")]
    InvalidConfig(String),

    #[error("transfer unit {unit} lies outside the migration root {root}")]
    UnitOutsideRoot { unit: String, root: String },
}

use thiserror::Error;
use uuid::Uuid;

/// Failures raised by the persistence adapters.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A uniqueness rule rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Raised by a payout transfer service; the message is shown to the caller.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct TransferError {
    pub message: String,
}

impl TransferError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
#[error("Notification dispatch failed: {0}")]
pub struct NotifyError(pub String);

/// Error taxonomy surfaced to callers of the fulfillment engine.
///
/// `NotFound` deliberately merges "absent" and "not yours" so that an
/// unauthorized actor cannot probe for the existence of an entity.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0} not found or access denied")]
    NotFound(&'static str),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Transfer failed for payment {payment_id}: {message}")]
    TransferFailure { payment_id: Uuid, message: String },
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Seed error: {0}")]
    Seed(String),
}

impl EngineError {
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Short machine-readable tag, used by the batch interface when
    /// reporting per-command failures.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidState(_) => "invalid_state",
            Self::ValidationError(_) => "validation_error",
            Self::InvalidOperation(_) => "invalid_operation",
            Self::TransferFailure { .. } => "transfer_failure",
            Self::Persistence(_) => "persistence_failure",
            Self::Csv(_) | Self::Io(_) | Self::Seed(_) => "input_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

use thiserror::Error;

/// Errors produced by the snapshot store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Generic I/O error (reading or replacing the snapshot file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot file exists but does not parse.
    #[error("Snapshot parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

use thiserror::Error;

/// Import and reconciliation error types
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid department path: {0:?}")]
    InvalidPath(String),

    #[error("Failed to create ancestor {path}: {source}")]
    AncestorCreate {
        path: String,
        #[source]
        source: Box<SyncError>,
    },

    #[error("Parent department not projected: {0}")]
    ParentNotProjected(String),

    #[error("Malformed tree serial: {0:?}")]
    MalformedSerial(String),

    #[error("Batch aborted: {0}")]
    BatchFatal(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

impl SyncError {
    /// Whether the error must abort and roll back the whole batch
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::BatchFatal(_) | SyncError::Csv(_) | SyncError::Io(_))
    }

    /// Render the error together with its source chain, one cause per line
    pub fn cause_chain(&self) -> String {
        let mut out = self.to_string();
        let mut current = std::error::Error::source(self);
        while let Some(cause) = current {
            out.push_str("\ncaused by: ");
            out.push_str(&cause.to_string());
            current = cause.source();
        }
        out
    }
}

/// Result type alias for the crate
pub type SyncResult<T> = Result<T, SyncError>;

/// Helper trait for converting Option to SyncError::NotFound
pub trait OptionExt<T> {
    fn ok_or_not_found(self, msg: impl Into<String>) -> SyncResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, msg: impl Into<String>) -> SyncResult<T> {
        self.ok_or_else(|| SyncError::NotFound(msg.into()))
    }
}

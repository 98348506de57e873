//! Import error log
//!
//! Every per-row failure becomes one `hr_import_error_log` row. Recording is
//! best-effort: a failed insert is reported through tracing and swallowed so
//! it never masks the original failure. Each insert runs in its own
//! savepoint, so a rejected event leaves an enclosing batch transaction usable.

use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, TransactionTrait};
use uuid::Uuid;

use crate::entity::error_log::{self, RecordType};
use crate::error::SyncError;

/// Author stamped on every event
pub const EVENT_AUTHOR: &str = "hrsync";

/// Error event to be recorded
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub record_type: RecordType,
    pub record_key: Option<String>,
    pub payload: Option<String>,
    pub message: String,
    pub stack_trace: Option<String>,
    pub file_name: Option<String>,
}

impl ErrorEvent {
    pub fn new(record_type: RecordType, message: impl Into<String>) -> Self {
        Self {
            record_type,
            record_key: None,
            payload: None,
            message: message.into(),
            stack_trace: None,
            file_name: None,
        }
    }

    /// Event carrying `err`'s message and its full cause chain
    pub fn from_error(record_type: RecordType, err: &SyncError) -> Self {
        let mut event = Self::new(record_type, err.to_string());
        event.stack_trace = Some(err.cause_chain());
        event
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.record_key = Some(key.into());
        self
    }

    pub fn payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn file(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

/// Persist `event`. Never fails.
pub async fn record<C>(db: &C, event: ErrorEvent)
where
    C: ConnectionTrait + TransactionTrait,
{
    tracing::warn!(
        "[{}] {}: {}",
        event.record_type.as_str(),
        event.record_key.as_deref().unwrap_or("-"),
        event.message
    );

    let log = error_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        file_name: Set(event.file_name),
        record_type: Set(event.record_type.as_str().to_string()),
        record_key: Set(event.record_key),
        payload: Set(event.payload),
        error_message: Set(event.message),
        stack_trace: Set(event.stack_trace),
        processed_at: Set(chrono::Utc::now().timestamp()),
        created_by: Set(EVENT_AUTHOR.to_string()),
    };

    let sp = match db.begin().await {
        Ok(sp) => sp,
        Err(e) => {
            tracing::error!("Failed to open savepoint for import error: {}", e);
            return;
        }
    };

    match log.insert(&sp).await {
        Ok(_) => {
            if let Err(e) = sp.commit().await {
                tracing::error!("Failed to commit import error: {}", e);
            }
        }
        Err(e) => {
            tracing::error!("Failed to record import error: {}", e);
            if let Err(re) = sp.rollback().await {
                tracing::error!("Rollback of import error savepoint failed: {}", re);
            }
        }
    }
}

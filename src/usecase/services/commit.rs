use std::sync::Arc;

use tracing::info;

use crate::domain::entities::report::PreviewSet;
use crate::usecase::ports::backend::{ReportWriter, ServiceError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The preview was empty; no write was issued.
    Nothing,
    /// The whole batch was persisted. Carries the backend's message.
    Committed { message: String },
}

/// Persists a preview as one atomic batch. On success the caller discards
/// the preview, resets to page 1 and restarts the version watcher; on
/// failure the preview is kept untouched for retry.
#[derive(Clone)]
pub struct CommitService {
    writer: Arc<dyn ReportWriter>,
}

impl CommitService {
    pub fn new(writer: Arc<dyn ReportWriter>) -> Self {
        Self { writer }
    }

    pub async fn commit(&self, preview: &PreviewSet) -> Result<CommitOutcome, ServiceError> {
        if preview.is_empty() {
            return Ok(CommitOutcome::Nothing);
        }

        let message = self.writer.replace_all(preview.rows.clone()).await?;
        info!(rows = preview.len(), "preview committed");
        Ok(CommitOutcome::Committed { message })
    }
}

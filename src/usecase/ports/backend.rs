use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::report::{DataPage, ReportRow, RowId, TabularData};

/// Failure reported by a backend collaborator. `Rejected` carries the
/// human-readable reason supplied by the backend; `Transport` stands in
/// when no reason is available.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Rejected(String),
    #[error("serviço indisponível")]
    Transport,
}

impl ServiceError {
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

/// Parses an uploaded file into rows and columns, optionally projected
/// onto an ordered list of column names.
#[async_trait]
pub trait IngestService: Send + Sync {
    async fn parse_tabular(
        &self,
        bytes: Vec<u8>,
        projection: Option<Vec<String>>,
    ) -> Result<TabularData, ServiceError>;
}

/// Paged read access to the committed dataset.
#[async_trait]
pub trait ReportReader: Send + Sync {
    async fn fetch_page(&self, page: i64, page_size: i64) -> Result<DataPage, ServiceError>;
}

/// Write access to the committed dataset.
#[async_trait]
pub trait ReportWriter: Send + Sync {
    /// Applies a single-column change to the row addressed by `id`.
    async fn patch_row(&self, id: RowId, column: String, value: String)
        -> Result<(), ServiceError>;

    /// Replaces the committed dataset with the given rows as one atomic
    /// batch. Returns the backend's confirmation message.
    async fn replace_all(&self, rows: Vec<ReportRow>) -> Result<String, ServiceError>;
}

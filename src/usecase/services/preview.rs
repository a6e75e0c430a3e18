use std::sync::Arc;

use crate::domain::entities::report::{PreviewSet, ID_COLUMN};
use crate::usecase::ports::backend::{IngestService, ServiceError};

/// Builds an unpersisted preview from an uploaded file. The caller keeps
/// the previous PreviewSet on failure; a success replaces it wholesale.
#[derive(Clone)]
pub struct PreviewService {
    ingest: Arc<dyn IngestService>,
}

impl PreviewService {
    pub fn new(ingest: Arc<dyn IngestService>) -> Self {
        Self { ingest }
    }

    pub async fn build_preview(
        &self,
        bytes: Vec<u8>,
        projection: Option<Vec<String>>,
    ) -> Result<PreviewSet, ServiceError> {
        let data = self.ingest.parse_tabular(bytes, projection).await?;

        // Preview rows carry no identity; strip the reserved column in
        // case the ingest side ever leaks it.
        let columns: Vec<String> = data
            .columns
            .into_iter()
            .filter(|column| column != ID_COLUMN)
            .collect();
        let rows = data
            .rows
            .into_iter()
            .map(|mut row| {
                row.id = None;
                row.strip_column(ID_COLUMN);
                row
            })
            .collect();

        Ok(PreviewSet { columns, rows })
    }
}

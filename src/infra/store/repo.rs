use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use tokio::task;

use crate::domain::entities::report::{DataPage, ReportRow, RowId};
use crate::infra::store::queries::{fetch_page_rows, patch_row_value, replace_all_rows};
use crate::infra::store::schema::init_db;
use crate::usecase::ports::backend::{ReportReader, ReportWriter, ServiceError};

/// In-process persistence collaborator backed by SQLite. Connections are
/// opened per operation from the stored path, so the handle is freely
/// shared across tasks.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    pub fn open(db_path: PathBuf) -> Result<Self> {
        init_db(&db_path)?;
        Ok(Self { db_path })
    }

    async fn run<T, F>(&self, op: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(PathBuf) -> Result<T> + Send + 'static,
    {
        let path = self.db_path.clone();
        task::spawn_blocking(move || op(path))
            .await
            .map_err(|_| ServiceError::Transport)?
            .map_err(|err| ServiceError::Rejected(format!("{err:#}")))
    }
}

#[async_trait]
impl ReportReader for SqliteStore {
    async fn fetch_page(&self, page: i64, page_size: i64) -> Result<DataPage, ServiceError> {
        self.run(move |path| fetch_page_rows(&path, page, page_size))
            .await
    }
}

#[async_trait]
impl ReportWriter for SqliteStore {
    async fn patch_row(
        &self,
        id: RowId,
        column: String,
        value: String,
    ) -> Result<(), ServiceError> {
        self.run(move |path| patch_row_value(&path, &id, &column, &value))
            .await
    }

    async fn replace_all(&self, rows: Vec<ReportRow>) -> Result<String, ServiceError> {
        let stored = self.run(move |path| replace_all_rows(&path, &rows)).await?;
        Ok(format!("Salvo {stored} linha(s)."))
    }
}

use tracing::debug;

use crate::domain::entities::report::{clamp_page, last_page, DataPage, VersionStamp};
use crate::usecase::ports::backend::{ReportReader, ServiceError};

/// Requests one page of the committed dataset. The page number is floored
/// to 1; clamping against the last page is the caller's navigation
/// concern via [`DatasetCache::clamp`].
pub async fn fetch_page(
    reader: &dyn ReportReader,
    page: i64,
    page_size: i64,
) -> Result<DataPage, ServiceError> {
    let page = page.max(1);
    let fetched = reader.fetch_page(page, page_size).await?;
    debug!(
        page = fetched.page,
        total = fetched.total,
        rows = fetched.rows.len(),
        version = fetched.version.0,
        "dataset page loaded"
    );
    Ok(fetched)
}

/// Holds the current page of committed rows. The page object is only ever
/// replaced as a whole snapshot, so readers never observe a half-updated
/// page.
#[derive(Debug, Default)]
pub struct DatasetCache {
    current: Option<DataPage>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&DataPage> {
        self.current.as_ref()
    }

    /// Snapshot replacement; no incremental merge.
    pub fn apply(&mut self, page: DataPage) {
        self.current = Some(page);
    }

    pub fn page(&self) -> i64 {
        self.current.as_ref().map(|p| p.page).unwrap_or(1)
    }

    pub fn total(&self) -> i64 {
        self.current.as_ref().map(|p| p.total).unwrap_or(0)
    }

    pub fn version(&self) -> VersionStamp {
        self.current
            .as_ref()
            .map(|p| p.version)
            .unwrap_or_default()
    }

    pub fn last_page(&self) -> i64 {
        self.current
            .as_ref()
            .map(|p| p.last_page())
            .unwrap_or(1)
    }

    /// Clamps a navigation target to `[1, last]`.
    pub fn clamp(&self, requested: i64) -> i64 {
        clamp_page(requested, self.last_page())
    }

    /// The pager disappears when there is nothing to page through.
    pub fn pager_hidden(&self) -> bool {
        match &self.current {
            Some(page) => page.rows.is_empty() || page.last_page() <= 1,
            None => true,
        }
    }
}

/// Convenience for callers that only have totals at hand.
pub fn pager_label(page: i64, total: i64, page_size: i64) -> String {
    format!("Página {page} / {}", last_page(total, page_size))
}

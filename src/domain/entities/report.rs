/// Reserved column carrying a row's persisted identity. Never rendered.
pub const ID_COLUMN: &str = "__id";

/// Opaque server-assigned row identity (a UUID in text form).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowId(pub String);

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque version stamp. Changes whenever the committed dataset changes;
/// only equality is meaningful.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionStamp(pub i64);

/// One row of a report: ordered column/value pairs plus an optional
/// persisted identity. A row without identity is volatile (preview only).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportRow {
    pub id: Option<RowId>,
    cells: Vec<(String, String)>,
}

impl ReportRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: RowId) -> Self {
        Self {
            id: Some(id),
            cells: Vec::new(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn get(&self, column: &str) -> &str {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| name == column) {
            Some((_, existing)) => *existing = value,
            None => self.cells.push((column.to_string(), value)),
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn strip_column(&mut self, column: &str) {
        self.cells.retain(|(name, _)| name != column);
    }
}

/// Parsed tabular content as returned by the ingest collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularData {
    pub columns: Vec<String>,
    pub rows: Vec<ReportRow>,
}

/// An unpersisted row set produced by ingest. Replaced wholesale by each
/// new preview; discarded without trace unless committed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewSet {
    pub columns: Vec<String>,
    pub rows: Vec<ReportRow>,
}

impl PreviewSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// One page of the committed dataset as reported by the server.
/// Always replaced as a whole, never patched field by field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPage {
    pub columns: Vec<String>,
    pub rows: Vec<ReportRow>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub version: VersionStamp,
}

impl DataPage {
    pub fn last_page(&self) -> i64 {
        last_page(self.total.max(self.rows.len() as i64), self.page_size)
    }

    /// Zero-based display offset of the first row on this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).max(0) * self.page_size
    }

    pub fn row_by_id_mut(&mut self, id: &RowId) -> Option<&mut ReportRow> {
        self.rows.iter_mut().find(|row| row.id.as_ref() == Some(id))
    }
}

pub fn last_page(total: i64, page_size: i64) -> i64 {
    if page_size <= 0 {
        return 1;
    }
    ((total + page_size - 1) / page_size).max(1)
}

pub fn clamp_page(requested: i64, last: i64) -> i64 {
    requested.clamp(1, last.max(1))
}

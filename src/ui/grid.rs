use crate::domain::entities::report::{ReportRow, RowId, ID_COLUMN};

/// Renderable description of a tabular view. `Empty` is an explicit
/// placeholder state, never a blank table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridModel {
    Empty,
    Table(GridTable),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridTable {
    pub columns: Vec<String>,
    pub rows: Vec<GridRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    /// 1-based index offset by the page's starting position.
    pub display_index: i64,
    pub identity: Option<RowId>,
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCell {
    pub column: String,
    pub value: String,
    pub editable: bool,
}

/// Pure mapping from (columns, rows, capability) to a grid description.
/// A cell is editable only when the capability allows it, the row is
/// persisted and the column is not the identity column; the identity
/// column itself is never rendered.
pub fn build_grid(columns: &[String], rows: &[ReportRow], can_edit: bool, offset: i64) -> GridModel {
    let visible: Vec<&String> = columns.iter().filter(|c| c.as_str() != ID_COLUMN).collect();
    if visible.is_empty() || rows.is_empty() {
        return GridModel::Empty;
    }

    let grid_rows = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| GridRow {
            display_index: offset + idx as i64 + 1,
            identity: row.id.clone(),
            cells: visible
                .iter()
                .map(|column| GridCell {
                    column: (*column).clone(),
                    value: row.get(column).to_string(),
                    editable: can_edit && row.is_persisted(),
                })
                .collect(),
        })
        .collect();

    GridModel::Table(GridTable {
        columns: visible.into_iter().cloned().collect(),
        rows: grid_rows,
    })
}

/// Escapes structural metacharacters before cell text is placed into any
/// markup surface. Hard contract for every markup-producing path.
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

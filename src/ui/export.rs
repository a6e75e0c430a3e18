use std::path::Path;

use anyhow::{Context, Result};

use crate::ui::grid::{escape_markup, GridModel, GridTable};

/// Serializes the rendered grid as a standalone HTML table. All cell text
/// goes through [`escape_markup`].
pub fn grid_to_html(grid: &GridModel) -> String {
    let GridModel::Table(table) = grid else {
        return "<p>Sem dados.</p>".to_string();
    };

    let mut html = String::from("<table>\n<thead><tr>");
    for column in &table.columns {
        html.push_str(&format!("<th>{}</th>", escape_markup(column)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in &row.cells {
            html.push_str(&format!("<td>{}</td>", escape_markup(&cell.value)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

/// Serializes the rendered grid as CSV (comma separated, quoted by the
/// csv crate as needed).
pub fn grid_to_csv(grid: &GridModel) -> Result<String> {
    let GridModel::Table(table) = grid else {
        return Ok(String::new());
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&table.columns)
        .context("failed to write csv header")?;
    for row in &table.rows {
        writer
            .write_record(row.cells.iter().map(|cell| cell.value.as_str()))
            .context("failed to write csv row")?;
    }
    let bytes = writer
        .into_inner()
        .context("failed to flush csv writer")?;
    String::from_utf8(bytes).context("csv output was not valid utf-8")
}

/// Writes the grid to disk, choosing the format from the file extension
/// (`.html` gets the escaped table, anything else CSV).
pub fn write_export(path: &Path, grid: &GridModel) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    let content = if ext == "html" || ext == "htm" {
        grid_to_html(grid)
    } else {
        grid_to_csv(grid)?
    };

    std::fs::write(path, content)
        .with_context(|| format!("failed to write export: {}", path.display()))?;
    Ok(())
}

pub fn export_is_empty(grid: &GridModel) -> bool {
    !matches!(grid, GridModel::Table(GridTable { rows, .. }) if !rows.is_empty())
}

use std::io::Cursor;

use anyhow::{Context, Result};
use calamine::{Data, Reader, Xlsx};

use crate::domain::entities::report::{ReportRow, TabularData};
use crate::infra::ingest::{normalize_header, project_columns, PREVIEW_ROW_LIMIT};

pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v.to_string(),
        Data::DateTimeIso(v) => v.to_string(),
        Data::DurationIso(v) => v.to_string(),
        Data::Error(v) => format!("{v:?}"),
        Data::Empty => String::new(),
    }
}

/// Parses the first worksheet of an XLSX file: first row as headers, the
/// rest as preview rows.
pub fn parse_xlsx(bytes: &[u8], projection: Option<&[String]>) -> Result<TabularData> {
    let mut workbook =
        Xlsx::new(Cursor::new(bytes.to_vec())).context("falha ao abrir o arquivo XLSX")?;

    let range = workbook
        .worksheet_range_at(0)
        .context("o arquivo XLSX não tem planilhas")?
        .context("falha ao ler a primeira planilha")?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = sheet_rows
        .next()
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
        .unwrap_or_default()
        .iter()
        .map(|header| normalize_header(header))
        .collect();

    if headers.is_empty() {
        anyhow::bail!("a planilha precisa de um cabeçalho");
    }

    let columns = project_columns(&headers, projection)?;

    let mut rows = Vec::new();
    for sheet_row in sheet_rows.take(PREVIEW_ROW_LIMIT) {
        let values: Vec<String> = sheet_row.iter().map(cell_to_string).collect();
        let mut row = ReportRow::new();
        for column in &columns {
            let idx = headers
                .iter()
                .position(|header| header == column)
                .unwrap_or(usize::MAX);
            let value = values.get(idx).map(String::as_str).unwrap_or("");
            row.set(column, value);
        }
        rows.push(row);
    }

    Ok(TabularData { columns, rows })
}

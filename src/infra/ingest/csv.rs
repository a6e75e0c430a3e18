use anyhow::{Context, Result};

use crate::domain::entities::report::{ReportRow, TabularData};
use crate::infra::ingest::{normalize_header, project_columns, PREVIEW_ROW_LIMIT};

/// Parses CSV bytes into a preview row set. Encoding is decoded lossily,
/// NUL bytes are stripped, and the separator is sniffed: `;` first, then
/// `,`, keeping the first that yields more than one column.
pub fn parse_csv(bytes: &[u8], projection: Option<&[String]>) -> Result<TabularData> {
    let text: String = String::from_utf8_lossy(bytes)
        .chars()
        .filter(|c| *c != '\0')
        .collect();

    let (headers, records) = read_with_sniffed_separator(&text)?;
    if headers.is_empty() {
        anyhow::bail!("o arquivo CSV precisa de um cabeçalho");
    }

    let columns = project_columns(&headers, projection)?;

    let mut rows = Vec::new();
    for record in records.iter().take(PREVIEW_ROW_LIMIT) {
        let mut row = ReportRow::new();
        for column in &columns {
            let idx = headers
                .iter()
                .position(|header| header == column)
                .unwrap_or(usize::MAX);
            let value = record.get(idx).map(String::as_str).unwrap_or("");
            row.set(column, value);
        }
        rows.push(row);
    }

    Ok(TabularData { columns, rows })
}

fn read_with_sniffed_separator(text: &str) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut fallback = None;
    for separator in [b';', b','] {
        let parsed = read_records(text, separator)?;
        if parsed.0.len() > 1 {
            return Ok(parsed);
        }
        fallback.get_or_insert(parsed);
    }
    // Single-column files are legal; keep the comma reading.
    Ok(fallback.unwrap_or_default())
}

fn read_records(text: &str, separator: u8) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(separator)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("falha ao ler o cabeçalho do CSV")?
        .iter()
        .map(normalize_header)
        .collect();

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.context("falha ao ler uma linha do CSV")?;
        records.push(record.iter().map(|value| value.to_string()).collect());
        if records.len() >= PREVIEW_ROW_LIMIT {
            break;
        }
    }

    Ok((headers, records))
}

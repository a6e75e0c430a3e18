use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::domain::entities::report::{
    clamp_page, last_page, DataPage, ReportRow, RowId, VersionStamp, ID_COLUMN,
};
use crate::infra::store::schema::open_connection;

fn bump_version(conn: &Connection) -> Result<()> {
    let now = Utc::now().timestamp();
    let current = read_version(conn)?;
    // Monotonic even for several writes within the same second.
    let next = now.max(current + 1);
    conn.execute(
        "INSERT INTO report_meta (id, version) VALUES (1, ?1)
         ON CONFLICT(id) DO UPDATE SET version = excluded.version",
        params![next],
    )
    .context("failed to bump version stamp")?;
    Ok(())
}

fn read_version(conn: &Connection) -> Result<i64> {
    let version: Option<i64> = conn
        .query_row("SELECT version FROM report_meta WHERE id = 1", [], |row| {
            row.get(0)
        })
        .optional()
        .context("failed to read version stamp")?;
    Ok(version.unwrap_or(0))
}

fn read_columns(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT name FROM report_column ORDER BY col_idx ASC")
        .context("failed to prepare columns query")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("failed to query columns")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect columns")?;
    Ok(columns)
}

/// Replaces the whole committed dataset inside one transaction, assigning
/// a fresh identity to every row, and bumps the version stamp. Returns
/// the number of rows stored.
pub fn replace_all_rows(db_path: &Path, rows: &[ReportRow]) -> Result<i64> {
    if rows.is_empty() {
        anyhow::bail!("sem linhas para salvar");
    }

    // Column order: first occurrence across the batch.
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for column in row.columns() {
            if column != ID_COLUMN && !columns.iter().any(|c| c == column) {
                columns.push(column.to_string());
            }
        }
    }
    if columns.is_empty() {
        anyhow::bail!("sem colunas para salvar");
    }

    let mut conn = open_connection(db_path)?;
    let tx = conn.transaction().context("failed to start transaction")?;

    tx.execute("DELETE FROM report_cell", [])
        .context("failed to clear rows")?;
    tx.execute("DELETE FROM report_column", [])
        .context("failed to clear columns")?;

    let mut insert_column = tx
        .prepare("INSERT INTO report_column (col_idx, name) VALUES (?1, ?2)")
        .context("failed to prepare column insert")?;
    for (idx, name) in columns.iter().enumerate() {
        insert_column
            .execute(params![idx as i64, name])
            .context("failed to insert column")?;
    }
    drop(insert_column);

    let mut insert_cell = tx
        .prepare("INSERT INTO report_cell (row_id, col_name, value) VALUES (?1, ?2, ?3)")
        .context("failed to prepare cell insert")?;
    for row in rows {
        let row_id = Uuid::new_v4().to_string();
        for column in &columns {
            insert_cell
                .execute(params![row_id, column, row.get(column)])
                .context("failed to insert cell")?;
        }
    }
    drop(insert_cell);

    bump_version(&tx)?;
    tx.commit().context("failed to commit replace transaction")?;

    Ok(rows.len() as i64)
}

/// Applies a single-column change to one persisted row and bumps the
/// version stamp.
pub fn patch_row_value(db_path: &Path, row_id: &RowId, column: &str, value: &str) -> Result<()> {
    let mut conn = open_connection(db_path)?;
    let tx = conn.transaction().context("failed to start transaction")?;

    let row_exists: i64 = tx
        .query_row(
            "SELECT COUNT(*) FROM report_cell WHERE row_id = ?1",
            params![row_id.0],
            |row| row.get(0),
        )
        .context("failed to check row existence")?;
    if row_exists == 0 {
        anyhow::bail!("Linha não encontrada.");
    }

    let column_known: i64 = tx
        .query_row(
            "SELECT COUNT(*) FROM report_column WHERE name = ?1",
            params![column],
            |row| row.get(0),
        )
        .context("failed to check column")?;
    if column_known == 0 {
        anyhow::bail!("Nada para atualizar.");
    }

    tx.execute(
        "INSERT INTO report_cell (row_id, col_name, value) VALUES (?1, ?2, ?3)
         ON CONFLICT(row_id, col_name) DO UPDATE SET value = excluded.value",
        params![row_id.0, column, value],
    )
    .context("failed to update cell")?;

    bump_version(&tx)?;
    tx.commit().context("failed to commit patch transaction")?;

    Ok(())
}

/// Reads one page of the committed dataset, ordered by row identity, with
/// the totals and version stamp taken in the same connection. Requests
/// past the end come back corrected to the last page, never empty.
pub fn fetch_page_rows(db_path: &Path, page: i64, page_size: i64) -> Result<DataPage> {
    if page_size <= 0 {
        anyhow::bail!("page_size must be greater than zero");
    }

    let conn = open_connection(db_path)?;

    let total: i64 = conn
        .query_row("SELECT COUNT(DISTINCT row_id) FROM report_cell", [], |row| {
            row.get(0)
        })
        .context("failed to count rows")?;
    let version = VersionStamp(read_version(&conn)?);

    if total == 0 {
        return Ok(DataPage {
            columns: Vec::new(),
            rows: Vec::new(),
            page: 1,
            page_size,
            total: 0,
            version,
        });
    }

    let columns = read_columns(&conn)?;

    let page = clamp_page(page, last_page(total, page_size));
    let offset = (page - 1) * page_size;
    let mut ids_stmt = conn
        .prepare(
            "SELECT DISTINCT row_id FROM report_cell
             ORDER BY row_id ASC
             LIMIT ?1 OFFSET ?2",
        )
        .context("failed to prepare page query")?;
    let row_ids = ids_stmt
        .query_map(params![page_size, offset], |row| row.get::<_, String>(0))
        .context("failed to query page row ids")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect page row ids")?;
    drop(ids_stmt);

    let mut cell_stmt = conn
        .prepare("SELECT col_name, value FROM report_cell WHERE row_id = ?1")
        .context("failed to prepare cell query")?;

    let mut rows = Vec::with_capacity(row_ids.len());
    for row_id in row_ids {
        let cells = cell_stmt
            .query_map(params![row_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .context("failed to query cells")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to collect cells")?;

        let mut row = ReportRow::with_id(RowId(row_id));
        for column in &columns {
            let value = cells
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, value)| value.as_str())
                .unwrap_or("");
            row.set(column, value);
        }
        rows.push(row);
    }

    Ok(DataPage {
        columns,
        rows,
        page,
        page_size,
        total,
        version,
    })
}

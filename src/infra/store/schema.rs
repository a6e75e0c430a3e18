use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open db: {}", db_path.display()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign key enforcement")?;
    Ok(conn)
}

pub fn init_db(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let conn = open_connection(db_path)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS report_column (
            col_idx     INTEGER PRIMARY KEY,
            name        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS report_cell (
            row_id      TEXT NOT NULL,
            col_name    TEXT NOT NULL,
            value       TEXT NOT NULL,
            PRIMARY KEY (row_id, col_name)
        );

        CREATE TABLE IF NOT EXISTS report_meta (
            id          INTEGER PRIMARY KEY CHECK (id = 1),
            version     INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_report_cell_row
            ON report_cell(row_id);
        ",
    )
    .context("failed to initialize schema")?;

    Ok(())
}

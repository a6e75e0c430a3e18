pub mod csv;
pub mod xlsx;

use anyhow::Result;
use async_trait::async_trait;
use tokio::task;

use crate::domain::entities::report::TabularData;
use crate::usecase::ports::backend::{IngestService, ServiceError};

/// Preview responses stop at this many rows.
pub const PREVIEW_ROW_LIMIT: usize = 100;

/// Columns the panel considers pertinent by default; used as the
/// projection when the operator restricts the preview.
pub const PERTINENT_COLUMNS: [&str; 20] = [
    "municipio",
    "cnes",
    "nome_fantasia",
    "profissional_nome",
    "profissional_cns",
    "profissional_atende_sus",
    "profissional_cbo",
    "carga_horaria_ambulatorial_sus",
    "carga_horaria_outros",
    "profissional_vinculo",
    "equipe_ine",
    "tipo_equipe",
    "equipe_subtipo",
    "equipe_nome",
    "equipe_area",
    "equipe_dt_ativacao",
    "equipe_dt_desativacao",
    "equipe_dt_entrada",
    "equipe_dt_desligamento",
    "natureza_juridica",
];

// Known typos seen in the source spreadsheets.
const HEADER_ALIASES: [(&str, &str); 1] = [("nome_fantaia", "nome_fantasia")];

/// Lowercases, trims and underscores a header, then fixes known typos.
pub fn normalize_header(raw: &str) -> String {
    let normalized = raw.trim().to_lowercase().replace(' ', "_");
    HEADER_ALIASES
        .iter()
        .find(|(from, _)| *from == normalized)
        .map(|(_, to)| to.to_string())
        .unwrap_or(normalized)
}

pub fn pertinent_projection() -> Vec<String> {
    PERTINENT_COLUMNS.iter().map(|c| c.to_string()).collect()
}

/// Intersects the parsed headers with an optional projection, keeping the
/// projection's order. Without a projection all headers pass through.
pub fn project_columns(headers: &[String], projection: Option<&[String]>) -> Result<Vec<String>> {
    let columns: Vec<String> = match projection {
        Some(wanted) => wanted
            .iter()
            .filter(|column| headers.contains(column))
            .cloned()
            .collect(),
        None => headers.to_vec(),
    };

    if columns.is_empty() {
        anyhow::bail!("nenhuma coluna reconhecida no arquivo");
    }
    Ok(columns)
}

const XLSX_MAGIC: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];

/// In-process ingest collaborator: XLSX when the bytes carry the ZIP
/// magic, CSV otherwise.
pub struct LocalIngest;

#[async_trait]
impl IngestService for LocalIngest {
    async fn parse_tabular(
        &self,
        bytes: Vec<u8>,
        projection: Option<Vec<String>>,
    ) -> Result<TabularData, ServiceError> {
        let parsed = task::spawn_blocking(move || {
            if bytes.starts_with(&XLSX_MAGIC) {
                xlsx::parse_xlsx(&bytes, projection.as_deref())
            } else {
                csv::parse_csv(&bytes, projection.as_deref())
            }
        })
        .await
        .map_err(|_| ServiceError::Transport)?;

        parsed.map_err(|err| ServiceError::Rejected(format!("{err:#}")))
    }
}

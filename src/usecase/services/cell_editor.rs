use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::domain::entities::edit::{CellEdit, CellKey};
use crate::domain::entities::report::DataPage;
use crate::usecase::ports::backend::{ReportWriter, ServiceError};

/// Resolution of one cell-patch transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Confirmed {
        key: CellKey,
        value: String,
    },
    Failed {
        key: CellKey,
        rollback: String,
        reason: String,
    },
}

impl EditOutcome {
    pub fn key(&self) -> &CellKey {
        match self {
            EditOutcome::Confirmed { key, .. } => key,
            EditOutcome::Failed { key, .. } => key,
        }
    }
}

/// How an outcome reconciled against the rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// A fresh page snapshot carrying the confirmed value, ready to
    /// swap in wholesale.
    Applied(DataPage),
    /// The cell rolls back to its pre-edit text.
    RolledBack,
    /// The target cell is no longer in the current page; nothing to do.
    Stale,
}

/// Tracks cells with a patch in flight. A cell must not accept a second
/// Saving transition while one is pending; transactions for different
/// cells are independent.
#[derive(Debug, Default)]
pub struct InFlight {
    cells: HashSet<CellKey>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_begin(&mut self, key: CellKey) -> bool {
        self.cells.insert(key)
    }

    pub fn contains(&self, key: &CellKey) -> bool {
        self.cells.contains(key)
    }

    pub fn finish(&mut self, key: &CellKey) {
        self.cells.remove(key);
    }
}

/// Submits single-cell patches to the write collaborator and reconciles
/// the result into the current page snapshot.
#[derive(Clone)]
pub struct CellEditor {
    writer: Arc<dyn ReportWriter>,
}

impl CellEditor {
    pub fn new(writer: Arc<dyn ReportWriter>) -> Self {
        Self { writer }
    }

    /// Sends the changed column's new value for the row addressed by the
    /// edit's key, then drives the edit to Confirmed or Failed. The caller
    /// must have moved the edit into Saving via
    /// [`CellEdit::try_begin_save`] first.
    pub async fn save(&self, edit: &mut CellEdit) -> EditOutcome {
        let key = edit.key.clone();
        let value = edit.current().to_string();
        let result = self
            .writer
            .patch_row(key.row.clone(), key.column.clone(), value.clone())
            .await;

        match result {
            Ok(()) => {
                edit.confirm();
                EditOutcome::Confirmed { key, value }
            }
            Err(err) => {
                let rollback = edit.fail();
                EditOutcome::Failed {
                    key,
                    rollback,
                    reason: reason_for(&err),
                }
            }
        }
    }
}

/// Resolves a finished transaction against the page the UI currently
/// renders. The page itself is never touched: a confirmed value comes
/// back as a new snapshot for the caller to swap in whole. If a
/// background refresh replaced the page and the target cell is gone,
/// the resolution is a no-op for rendering; the server-side effect
/// stands and the next refresh reconciles the view.
pub fn reconcile(page: &DataPage, outcome: &EditOutcome) -> Reconciliation {
    let key = outcome.key();
    let mut next = page.clone();
    let Some(row) = next.row_by_id_mut(&key.row) else {
        debug!(row = %key.row, column = %key.column, "edit resolved after its row left the page");
        return Reconciliation::Stale;
    };

    match outcome {
        EditOutcome::Confirmed { value, .. } => {
            row.set(&key.column, value.clone());
            Reconciliation::Applied(next)
        }
        // The retained snapshot still holds the pre-edit value; dropping
        // the optimistic overlay is the whole rollback.
        EditOutcome::Failed { .. } => Reconciliation::RolledBack,
    }
}

fn reason_for(err: &ServiceError) -> String {
    match err {
        ServiceError::Rejected(message) if !message.trim().is_empty() => message.clone(),
        _ => "falha ao gravar a alteração".to_string(),
    }
}

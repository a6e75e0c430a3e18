use crate::domain::entities::report::RowId;

/// Identifies one editable cell of a persisted row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub row: RowId,
    pub column: String,
}

impl CellKey {
    pub fn new(row: RowId, column: impl Into<String>) -> Self {
        Self {
            row,
            column: column.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPhase {
    Idle,
    Dirty,
    Saving,
    Confirmed,
    Failed,
}

/// Per-cell edit transaction. Created when a cell gains edit focus,
/// destroyed when it settles back to Idle. Never shared across cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEdit {
    pub key: CellKey,
    original: String,
    current: String,
    phase: EditPhase,
}

impl CellEdit {
    /// Focus-in: capture the text shown at that moment as the rollback
    /// point. No network call happens here.
    pub fn begin(key: CellKey, current_text: impl Into<String>) -> Self {
        let current = current_text.into();
        Self {
            key,
            original: current.clone(),
            current,
            phase: EditPhase::Dirty,
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn phase(&self) -> EditPhase {
        self.phase
    }

    pub fn input(&mut self, text: impl Into<String>) {
        if self.phase == EditPhase::Dirty {
            self.current = text.into();
        }
    }

    pub fn is_changed(&self) -> bool {
        self.current != self.original
    }

    /// Explicit cancel: revert to the captured text without any network
    /// call. Returns the text to display.
    pub fn cancel(mut self) -> String {
        self.phase = EditPhase::Idle;
        self.original
    }

    /// Blur with changed text. Refused while a save is already in flight
    /// or when nothing changed.
    pub fn try_begin_save(&mut self) -> bool {
        if self.phase != EditPhase::Dirty || !self.is_changed() {
            return false;
        }
        self.phase = EditPhase::Saving;
        true
    }

    /// Server accepted the patch: the new value becomes the rollback
    /// point for any later edit.
    pub fn confirm(&mut self) {
        if self.phase == EditPhase::Saving {
            self.original = self.current.clone();
            self.phase = EditPhase::Confirmed;
        }
    }

    /// Server rejected the patch: roll the displayed text back. Returns
    /// the text to display.
    pub fn fail(&mut self) -> String {
        if self.phase == EditPhase::Saving {
            self.current = self.original.clone();
            self.phase = EditPhase::Failed;
        }
        self.original.clone()
    }

    /// After the brief success/error indication the cell returns to Idle.
    pub fn settle(&mut self) {
        if matches!(self.phase, EditPhase::Confirmed | EditPhase::Failed) {
            self.phase = EditPhase::Idle;
        }
    }
}

pub mod capability;
pub mod cell_editor;
pub mod commit;
pub mod dataset;
pub mod preview;
pub mod watcher;

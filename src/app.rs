use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use dioxus::prelude::*;
use rfd::FileDialog;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::domain::entities::edit::{CellEdit, CellKey};
use crate::domain::entities::report::{PreviewSet, VersionStamp};
use crate::infra::ingest::{pertinent_projection, LocalIngest};
use crate::infra::store::repo::SqliteStore;
use crate::ui::export::{export_is_empty, write_export};
use crate::ui::grid::{build_grid, GridModel};
use crate::usecase::services::capability::can_edit as role_can_edit;
use crate::usecase::services::cell_editor::{reconcile, CellEditor, EditOutcome, InFlight, Reconciliation};
use crate::usecase::services::commit::{CommitOutcome, CommitService};
use crate::usecase::services::dataset::{fetch_page, pager_label, DatasetCache};
use crate::usecase::services::preview::PreviewService;
use crate::usecase::services::watcher::VersionWatcher;
use crate::AppConfig;

/// Which row set the table currently shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TableSource {
    None,
    Preview,
    Dataset,
}

/// Transient per-cell highlight after a save resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellFlash {
    Saved,
    Error,
}

const FLASH_SAVED_MS: u64 = 600;
const FLASH_ERROR_MS: u64 = 900;

struct Services {
    config: AppConfig,
    session: crate::domain::entities::session::Session,
    can_edit: bool,
    store: Arc<SqliteStore>,
    preview: PreviewService,
    editor: CellEditor,
    commit: CommitService,
}

fn boot_services() -> anyhow::Result<Services> {
    let config = AppConfig::from_env()?;
    let session = crate::domain::entities::session::Session::from_env();
    let can_edit = role_can_edit(&session);
    let store = Arc::new(SqliteStore::open(config.db_path.clone())?);
    let preview = PreviewService::new(Arc::new(LocalIngest));
    let editor = CellEditor::new(store.clone());
    let commit = CommitService::new(store.clone());
    Ok(Services {
        config,
        session,
        can_edit,
        store,
        preview,
        editor,
        commit,
    })
}

async fn load_and_apply(
    store: Arc<SqliteStore>,
    page_size: i64,
    target: i64,
    mut cache: Signal<DatasetCache>,
    mut source: Signal<TableSource>,
    mut status: Signal<String>,
) -> bool {
    match fetch_page(store.as_ref(), target, page_size).await {
        Ok(page) => {
            let shown = page.rows.len();
            let current = page.page;
            let last = page.last_page();
            let total = page.total;
            cache.write().apply(page);
            *source.write() = TableSource::Dataset;
            *status.write() = if shown > 0 {
                format!("Mostrando página {current} de {last} (total {total})")
            } else {
                "Sem dados.".to_string()
            };
            true
        }
        Err(err) => {
            *status.write() = format!("Erro ao carregar dados: {}", err.reason());
            false
        }
    }
}

fn restart_watcher(
    mut watcher: Signal<VersionWatcher>,
    store: Arc<SqliteStore>,
    every: Duration,
    last_seen: VersionStamp,
    refresh_tx: UnboundedSender<VersionStamp>,
) {
    watcher
        .write()
        .restart(store, every, last_seen, move |version| {
            let _ = refresh_tx.send(version);
        });
}

/// Moves a focused edit through the save pipeline: mark the cell busy,
/// show the typed text optimistically, submit the patch, then reconcile
/// the outcome into whatever page the table shows by then.
fn spawn_save(
    editor: CellEditor,
    mut edit: CellEdit,
    mut in_flight: Signal<InFlight>,
    mut overlay: Signal<HashMap<CellKey, String>>,
    mut cache: Signal<DatasetCache>,
    mut flash: Signal<HashMap<CellKey, CellFlash>>,
    mut status: Signal<String>,
) {
    if !edit.try_begin_save() {
        return;
    }
    let key = edit.key.clone();
    if !in_flight.write().try_begin(key.clone()) {
        return;
    }
    overlay
        .write()
        .insert(key.clone(), edit.current().to_string());

    spawn(async move {
        let outcome = editor.save(&mut edit).await;
        edit.settle();

        in_flight.write().finish(&key);
        overlay.write().remove(&key);

        let snapshot = cache.read().current().cloned();
        let resolution = match snapshot.as_ref() {
            Some(page) => reconcile(page, &outcome),
            None => Reconciliation::Stale,
        };
        let stale = matches!(resolution, Reconciliation::Stale);
        if let Reconciliation::Applied(next) = resolution {
            cache.write().apply(next);
        }

        let (indicator, hold_ms) = match &outcome {
            EditOutcome::Confirmed { .. } => (CellFlash::Saved, FLASH_SAVED_MS),
            EditOutcome::Failed { reason, .. } => {
                *status.write() = format!("Erro ao salvar: {reason}");
                (CellFlash::Error, FLASH_ERROR_MS)
            }
        };

        if !stale {
            flash.write().insert(key.clone(), indicator);
            spawn(async move {
                tokio::time::sleep(Duration::from_millis(hold_ms)).await;
                flash.write().remove(&key);
            });
        }
    });
}

struct CellView {
    key: Option<CellKey>,
    text: String,
    editable: bool,
    editing: bool,
    edit_text: String,
    saving: bool,
    flash: Option<CellFlash>,
}

struct RowView {
    display_index: i64,
    cells: Vec<CellView>,
}

fn cell_style(view: &CellView) -> &'static str {
    match view.flash {
        Some(CellFlash::Saved) => "border: 1px solid #bbb; padding: 6px; background: #d9f7d9;",
        Some(CellFlash::Error) => "border: 1px solid #bbb; padding: 6px; background: #f7d9d9;",
        None if view.saving => "border: 1px solid #bbb; padding: 6px; opacity: 0.6;",
        None => "border: 1px solid #bbb; padding: 6px;",
    }
}

#[component]
pub fn App() -> Element {
    let boot = use_hook(|| Rc::new(boot_services()));
    let services = match boot.as_ref() {
        Ok(services) => services,
        Err(err) => {
            let message = format!("Falha ao iniciar o painel: {err:#}");
            return rsx! {
                div { style: "padding: 16px; color: #a00;", "{message}" }
            };
        }
    };

    let page_size = services.config.page_size;
    let poll_interval = services.config.poll_interval;
    let can_edit = services.can_edit;
    let display_name = services.session.display_name.clone();
    let role = services.session.role.clone();

    let mut preview = use_signal(|| None::<PreviewSet>);
    let cache = use_signal(DatasetCache::new);
    let mut source = use_signal(|| TableSource::None);
    let mut status = use_signal(|| "Carregando…".to_string());
    let mut busy = use_signal(|| false);
    let mut editing = use_signal(|| None::<CellEdit>);
    let in_flight = use_signal(InFlight::new);
    let flash = use_signal(HashMap::<CellKey, CellFlash>::new);
    let overlay = use_signal(HashMap::<CellKey, String>::new);
    let watcher = use_signal(VersionWatcher::new);
    let mut selected_file = use_signal(|| None::<PathBuf>);
    let mut only_pertinent = use_signal(|| true);

    let refresh_channel = use_hook(|| {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<VersionStamp>();
        (tx, Rc::new(RefCell::new(Some(rx))))
    });
    let refresh_tx = refresh_channel.0.clone();

    // Drains version-change notifications from the watcher and reloads
    // the page the user is looking at.
    {
        let store = services.store.clone();
        let rx_slot = refresh_channel.1.clone();
        let refresh_tx = refresh_tx.clone();
        use_future(move || {
            let store = store.clone();
            let refresh_tx = refresh_tx.clone();
            let rx: Option<UnboundedReceiver<VersionStamp>> = rx_slot.borrow_mut().take();
            async move {
                let Some(mut rx) = rx else { return };
                while let Some(version) = rx.recv().await {
                    debug!(version = version.0, "dataset version changed; reloading");
                    let target = cache.read().page();
                    let ok =
                        load_and_apply(store.clone(), page_size, target, cache, source, status)
                            .await;
                    if ok {
                        restart_watcher(
                            watcher,
                            store.clone(),
                            poll_interval,
                            cache.read().version(),
                            refresh_tx.clone(),
                        );
                    }
                }
            }
        });
    }

    // Initial load of whatever is already committed, then start polling.
    {
        let store = services.store.clone();
        let refresh_tx = refresh_tx.clone();
        use_future(move || {
            let store = store.clone();
            let refresh_tx = refresh_tx.clone();
            async move {
                *busy.write() = true;
                let ok = load_and_apply(store.clone(), page_size, 1, cache, source, status).await;
                if ok {
                    restart_watcher(
                        watcher,
                        store,
                        poll_interval,
                        cache.read().version(),
                        refresh_tx,
                    );
                }
                *busy.write() = false;
            }
        });
    }

    let grid = match source() {
        TableSource::Preview => match preview() {
            Some(set) => build_grid(&set.columns, &set.rows, can_edit, 0),
            None => GridModel::Empty,
        },
        TableSource::Dataset => match cache.read().current() {
            Some(page) => build_grid(&page.columns, &page.rows, can_edit, page.offset()),
            None => GridModel::Empty,
        },
        TableSource::None => GridModel::Empty,
    };

    let editing_now = editing();
    let (header_columns, row_views): (Vec<String>, Vec<RowView>) = match &grid {
        GridModel::Empty => (Vec::new(), Vec::new()),
        GridModel::Table(table) => {
            let overlay_now = overlay.read();
            let flash_now = flash.read();
            let in_flight_now = in_flight.read();
            let rows = table
                .rows
                .iter()
                .map(|row| RowView {
                    display_index: row.display_index,
                    cells: row
                        .cells
                        .iter()
                        .map(|cell| {
                            let key = row
                                .identity
                                .clone()
                                .map(|id| CellKey::new(id, cell.column.clone()));
                            let is_editing = key
                                .as_ref()
                                .zip(editing_now.as_ref())
                                .is_some_and(|(k, edit)| *k == edit.key);
                            let saving =
                                key.as_ref().is_some_and(|k| in_flight_now.contains(k));
                            let text = key
                                .as_ref()
                                .and_then(|k| overlay_now.get(k).cloned())
                                .unwrap_or_else(|| cell.value.clone());
                            CellView {
                                text,
                                editable: cell.editable && !saving,
                                editing: is_editing,
                                edit_text: editing_now
                                    .as_ref()
                                    .filter(|_| is_editing)
                                    .map(|edit| edit.current().to_string())
                                    .unwrap_or_default(),
                                saving,
                                flash: key.as_ref().and_then(|k| flash_now.get(k).copied()),
                                key,
                            }
                        })
                        .collect(),
                })
                .collect();
            (table.columns.clone(), rows)
        }
    };

    let pager_hidden = source() != TableSource::Dataset || cache.read().pager_hidden();
    let current_page = cache.read().page();
    let last_page = cache.read().last_page();
    let pager_text = pager_label(current_page, cache.read().total(), page_size);
    let preview_disabled = busy() || selected_file().is_none();
    let commit_disabled = busy() || preview().map(|set| set.is_empty()).unwrap_or(true);
    let export_disabled = export_is_empty(&grid);
    let export_grid = grid.clone();
    let editor = services.editor.clone();
    let preview_svc = services.preview.clone();
    let commit_svc = services.commit.clone();
    let store_for_commit = services.store.clone();
    let store_for_prev = services.store.clone();
    let store_for_next = services.store.clone();
    let refresh_tx_for_commit = refresh_tx.clone();
    let refresh_tx_for_prev = refresh_tx.clone();
    let refresh_tx_for_next = refresh_tx.clone();

    rsx! {
        div { style: "font-family: sans-serif; padding: 12px;",
            header {
                style: "display: flex; gap: 12px; align-items: baseline; border-bottom: 1px solid #ddd; padding-bottom: 8px;",
                h2 { style: "margin: 0;", "Painel de Relatórios" }
                span { "{display_name}" }
                span {
                    style: "padding: 2px 8px; border-radius: 10px; background: #eef4ff; font-size: 12px;",
                    "{role}"
                }
            }

            nav {
                style: "display: flex; gap: 12px; align-items: center; flex-wrap: wrap; padding: 8px 0;",
                button {
                    disabled: busy(),
                    onclick: move |_| {
                        let Some(file_path) = FileDialog::new()
                            .add_filter("Dados", &["csv", "xlsx"])
                            .pick_file() else {
                            return;
                        };
                        *selected_file.write() = Some(file_path);
                    },
                    "Escolher arquivo…"
                }

                if let Some(path) = selected_file() {
                    span { style: "color: #666;", "{path.display()}" }
                }

                label {
                    input {
                        r#type: "checkbox",
                        checked: only_pertinent(),
                        onchange: move |event| {
                            let checked = event.value().parse::<bool>().unwrap_or(false);
                            *only_pertinent.write() = checked;
                        },
                    }
                    "Somente colunas pertinentes"
                }

                button {
                    disabled: preview_disabled,
                    onclick: move |_| {
                        let Some(path) = selected_file() else {
                            *status.write() = "Escolha um arquivo CSV ou XLSX.".to_string();
                            return;
                        };
                        let preview_svc = preview_svc.clone();
                        spawn(async move {
                            *busy.write() = true;
                            *status.write() = "Gerando pré-visualização…".to_string();

                            let projection = if only_pertinent() {
                                Some(pertinent_projection())
                            } else {
                                None
                            };

                            let bytes = match std::fs::read(&path) {
                                Ok(bytes) => bytes,
                                Err(err) => {
                                    *status.write() = format!("Erro ao ler o arquivo: {err}");
                                    *busy.write() = false;
                                    return;
                                }
                            };

                            match preview_svc.build_preview(bytes, projection).await {
                                Ok(set) => {
                                    let count = set.len();
                                    *preview.write() = Some(set);
                                    *source.write() = TableSource::Preview;
                                    *editing.write() = None;
                                    *status.write() =
                                        format!("Pré-visualização: {count} linha(s).");
                                }
                                Err(err) => {
                                    *status.write() =
                                        format!("Erro ao pré-visualizar: {}", err.reason());
                                }
                            }
                            *busy.write() = false;
                        });
                    },
                    "Pré-visualizar"
                }

                button {
                    disabled: commit_disabled,
                    onclick: move |_| {
                        let Some(set) = preview() else {
                            *status.write() = "Nada para salvar.".to_string();
                            return;
                        };
                        let commit_svc = commit_svc.clone();
                        let store = store_for_commit.clone();
                        let refresh_tx = refresh_tx_for_commit.clone();
                        spawn(async move {
                            *busy.write() = true;
                            *status.write() = "Salvando no banco…".to_string();

                            match commit_svc.commit(&set).await {
                                Ok(CommitOutcome::Nothing) => {
                                    *status.write() = "Nada para salvar.".to_string();
                                }
                                Ok(CommitOutcome::Committed { message }) => {
                                    *preview.write() = None;
                                    *status.write() = format!("✅ {message}");
                                    let ok = load_and_apply(
                                        store.clone(),
                                        page_size,
                                        1,
                                        cache,
                                        source,
                                        status,
                                    )
                                    .await;
                                    if ok {
                                        restart_watcher(
                                            watcher,
                                            store,
                                            poll_interval,
                                            cache.read().version(),
                                            refresh_tx,
                                        );
                                    }
                                }
                                Err(err) => {
                                    *status.write() =
                                        format!("Erro ao salvar: {}", err.reason());
                                }
                            }
                            *busy.write() = false;
                        });
                    },
                    "Salvar"
                }

                button {
                    disabled: export_disabled,
                    onclick: move |_| {
                        let Some(target) = FileDialog::new()
                            .add_filter("CSV", &["csv"])
                            .add_filter("HTML", &["html"])
                            .save_file() else {
                            return;
                        };
                        match write_export(&target, &export_grid) {
                            Ok(()) => {
                                *status.write() = format!("Exportado para {}", target.display());
                            }
                            Err(err) => {
                                *status.write() = format!("Erro ao exportar: {err:#}");
                            }
                        }
                    },
                    "Exportar"
                }
            }

            div { style: "padding: 4px 0; color: #444;", "{status}" }

            if row_views.is_empty() {
                div { style: "padding: 16px; color: #777;", "Sem dados." }
            } else {
                table { style: "border-collapse: collapse; width: 100%; border: 1px solid #bbb;",
                    thead {
                        tr {
                            if can_edit {
                                th { style: "border: 1px solid #bbb; padding: 6px; background: #f2f2f2; width: 48px;", "#" }
                            }
                            for header in header_columns {
                                th { style: "border: 1px solid #bbb; padding: 6px; background: #f2f2f2; text-align: left;", "{header}" }
                            }
                        }
                    }
                    tbody {
                        for row in row_views {
                            tr {
                                if can_edit {
                                    td { style: "border: 1px solid #bbb; padding: 6px; color: #888;", "{row.display_index}" }
                                }
                                for cell in row.cells {
                                    if cell.editing {
                                        td { style: cell_style(&cell),
                                            input {
                                                style: "width: 100%; box-sizing: border-box;",
                                                value: "{cell.edit_text}",
                                                autofocus: true,
                                                oninput: move |event| {
                                                    if let Some(edit) = editing.write().as_mut() {
                                                        edit.input(event.value());
                                                    }
                                                },
                                                onkeydown: {
                                                    let editor = editor.clone();
                                                    move |event: KeyboardEvent| {
                                                        if event.key() == Key::Enter {
                                                            if let Some(edit) = editing.write().take() {
                                                                spawn_save(
                                                                    editor.clone(), edit, in_flight,
                                                                    overlay, cache, flash, status,
                                                                );
                                                            }
                                                        } else if event.key() == Key::Escape {
                                                            // Explicit cancel never touches the backend.
                                                            if let Some(edit) = editing.write().take() {
                                                                let _ = edit.cancel();
                                                            }
                                                        }
                                                    }
                                                },
                                                onblur: {
                                                    let editor = editor.clone();
                                                    move |_| {
                                                        if let Some(edit) = editing.write().take() {
                                                            spawn_save(
                                                                editor.clone(), edit, in_flight,
                                                                overlay, cache, flash, status,
                                                            );
                                                        }
                                                    }
                                                },
                                            }
                                        }
                                    } else {
                                        td {
                                            style: cell_style(&cell),
                                            ondoubleclick: {
                                                let key = cell.key.clone();
                                                let text = cell.text.clone();
                                                let editable = cell.editable;
                                                move |_| {
                                                    if !editable {
                                                        return;
                                                    }
                                                    let Some(key) = key.clone() else {
                                                        return;
                                                    };
                                                    if in_flight.read().contains(&key) {
                                                        return;
                                                    }
                                                    *editing.write() =
                                                        Some(CellEdit::begin(key, text.clone()));
                                                }
                                            },
                                            "{cell.text}"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }

            if !pager_hidden {
                div { style: "display: flex; gap: 8px; align-items: center; padding: 8px 0;",
                    button {
                        disabled: busy() || current_page <= 1,
                        onclick: move |_| {
                            let target = cache.read().clamp(current_page - 1);
                            if target == current_page {
                                return;
                            }
                            let store = store_for_prev.clone();
                            let refresh_tx = refresh_tx_for_prev.clone();
                            spawn(async move {
                                *busy.write() = true;
                                let ok = load_and_apply(
                                    store.clone(), page_size, target, cache, source, status,
                                )
                                .await;
                                if ok {
                                    restart_watcher(
                                        watcher, store, poll_interval,
                                        cache.read().version(), refresh_tx,
                                    );
                                }
                                *busy.write() = false;
                            });
                        },
                        "Anterior"
                    }
                    span { "{pager_text}" }
                    button {
                        disabled: busy() || current_page >= last_page,
                        onclick: move |_| {
                            let target = cache.read().clamp(current_page + 1);
                            if target == current_page {
                                return;
                            }
                            let store = store_for_next.clone();
                            let refresh_tx = refresh_tx_for_next.clone();
                            spawn(async move {
                                *busy.write() = true;
                                let ok = load_and_apply(
                                    store.clone(), page_size, target, cache, source, status,
                                )
                                .await;
                                if ok {
                                    restart_watcher(
                                        watcher, store, poll_interval,
                                        cache.read().version(), refresh_tx,
                                    );
                                }
                                *busy.write() = false;
                            });
                        },
                        "Próxima"
                    }
                }
            }
        }
    }
}

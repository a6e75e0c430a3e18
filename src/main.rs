mod app;
mod domain;
mod infra;
mod ui;
mod usecase;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const DEFAULT_POLL_MS: u64 = 5000;

/// Runtime knobs of the panel, read from the environment with defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub page_size: i64,
    pub poll_interval: Duration,
    pub db_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let page_size = std::env::var("PAINEL_PAGE_SIZE")
            .ok()
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let poll_ms = std::env::var("PAINEL_POLL_MS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_POLL_MS);

        let db_path = match std::env::var("PAINEL_DB") {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_db_path()?,
        };

        Ok(Self {
            page_size,
            poll_interval: Duration::from_millis(poll_ms),
            db_path,
        })
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("br", "painel", "relatorios")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
    Ok(project_dirs.data_local_dir().join("relatorios.sqlite"))
}

fn ensure_webview_data_dir(base_data_dir: &std::path::Path) -> Result<PathBuf> {
    let webview_data_dir = base_data_dir.join("webview2");
    std::fs::create_dir_all(&webview_data_dir).with_context(|| {
        format!(
            "failed to create webview dir: {}",
            webview_data_dir.display()
        )
    })?;
    Ok(webview_data_dir)
}

fn default_webview_data_dir() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("br", "painel", "relatorios")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
    ensure_webview_data_dir(project_dirs.data_local_dir())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    // Background tasks (version watcher, blocking store calls) run on
    // this runtime; the webview event loop stays on the main thread.
    let runtime = tokio::runtime::Runtime::new().expect("should build tokio runtime");
    let _guard = runtime.enter();

    let webview_data_dir =
        default_webview_data_dir().expect("should resolve and create WebView2 data directory");

    #[cfg(feature = "desktop")]
    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new()
                .with_window(
                    dioxus::desktop::WindowBuilder::new().with_title("Painel de Relatórios"),
                )
                .with_data_directory(webview_data_dir),
        )
        .launch(app::App);
}

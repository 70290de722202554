use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sales_core::settings::DEFAULT_DATA_FILE;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// `~/.coffee-dashboard`, or `./.coffee-dashboard` without a home directory.
pub fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".coffee-dashboard")
}

/// Create `~/.coffee-dashboard/` if absent. It holds the saved preferences
/// and may hold the fallback transactions file.
pub fn ensure_directories() -> anyhow::Result<()> {
    ensure_directories_in(&app_dir())
}

fn ensure_directories_in(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `--log-level` name onto a tracing filter directive.
fn level_directive(log_level: &str) -> &'static str {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Events go to stderr, or are appended to `log_file` (without colour codes)
/// when one is given. `RUST_LOG` is ignored; the level comes from settings.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(level_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let stderr_layer = file_layer.is_none().then(|| {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

// ── Data-path discovery ────────────────────────────────────────────────────────

/// Decide which transactions file to read.
///
/// In order: the explicit path; `./coffee_shop_clean.csv`;
/// `~/.coffee-dashboard/coffee_shop_clean.csv`. When none exists the
/// working-directory path is returned so the load error names it.
pub fn discover_data_path(explicit: Option<&Path>) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    discover_data_path_in(explicit, &cwd, &app_dir())
}

fn discover_data_path_in(explicit: Option<&Path>, cwd: &Path, app_dir: &Path) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let local = cwd.join(DEFAULT_DATA_FILE);
    let candidates = [local.clone(), app_dir.join(DEFAULT_DATA_FILE)];
    candidates
        .into_iter()
        .find(|p| p.is_file())
        .unwrap_or(local)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

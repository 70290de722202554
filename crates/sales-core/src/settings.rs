use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the transactions file looked up when `--data-file` is not given.
pub const DEFAULT_DATA_FILE: &str = "coffee_shop_clean.csv";

/// Number of products shown in the top-products view.
pub const DEFAULT_TOP_N: u32 = 15;

/// Views of the chain-wide dashboard, in display order.
pub const OVERVIEW_VIEWS: &[&str] = &["overview", "monthly", "hourly", "top-products"];

/// Views of the single-store dashboard, in display order.
pub const STORE_VIEWS: &[&str] = &["daily", "categories", "hierarchy"];

/// `true` when `view` is `"all"` or one of `variant`'s views.
pub fn view_fits_variant(variant: &str, view: &str) -> bool {
    let views = match variant {
        "overview" => OVERVIEW_VIEWS,
        "store" => STORE_VIEWS,
        _ => return false,
    };
    view == "all" || views.contains(&view)
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Coffee shop sales dashboards
#[derive(Parser, Debug, Clone)]
#[command(
    name = "coffee-dashboard",
    about = "Coffee shop sales dashboards",
    version
)]
pub struct Settings {
    /// Transactions CSV (defaults to ./coffee_shop_clean.csv)
    #[arg(long)]
    pub data_file: Option<PathBuf>,

    /// Dashboard variant
    #[arg(long, default_value = "overview", value_parser = ["overview", "store"])]
    pub variant: String,

    /// View (tab) to render
    #[arg(long, default_value = "all", value_parser = [
        "all", "overview", "monthly", "hourly", "top-products", "daily", "categories", "hierarchy",
    ])]
    pub view: String,

    /// Store locations to include (repeatable; overview variant)
    #[arg(long = "location")]
    pub locations: Vec<String>,

    /// Product categories to include (repeatable; overview variant)
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// Months (YYYY-MM) to include (repeatable; overview variant)
    #[arg(long = "month")]
    pub months: Vec<String>,

    /// Single store location (store variant)
    #[arg(long)]
    pub store: Option<String>,

    /// Number of products in the top-products view (1-100)
    #[arg(long, default_value = "15", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub top: u32,

    /// Output format
    #[arg(long, default_value = "table", value_parser = ["table", "json"])]
    pub format: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,

    /// Problems met while reading or writing saved preferences. They are
    /// collected here because logging is not set up yet at that point.
    #[arg(skip)]
    pub notices: Vec<String>,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Preferences saved to `~/.coffee-dashboard/last_used.json`.
///
/// Filters are deliberately absent: they start from "everything selected" on
/// every run.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<u32>,
}

impl LastUsedParams {
    /// Default location of the persisted preferences.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".coffee-dashboard").join("last_used.json")
    }

    /// Returns `Default` when the file is absent or unreadable.
    pub fn load_from(path: &std::path::Path) -> Self {
        Self::read_from(path).unwrap_or_default()
    }

    /// Like [`LastUsedParams::load_from`], but reports a file that exists and
    /// cannot be read or parsed. An absent file is `Default`.
    pub fn read_from(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e),
        };
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Write through a temp file and rename, creating parent directories.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments, merge saved preferences and persist the
    /// outcome for the next run.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with explicit arguments and
    /// config path.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                settings
                    .notices
                    .push(format!("could not clear {}: {}", config_path.display(), e));
            }
            return settings.apply_debug();
        }

        let last = LastUsedParams::read_from(config_path).unwrap_or_else(|e| {
            settings.notices.push(format!(
                "ignoring unreadable {}: {}",
                config_path.display(),
                e
            ));
            LastUsedParams::default()
        });

        // CLI always wins over the saved value.
        if !is_arg_explicitly_set(&matches, "data_file") && settings.data_file.is_none() {
            settings.data_file = last.data_file;
        }
        if !is_arg_explicitly_set(&matches, "variant") {
            if let Some(v) = last.variant.clone() {
                settings.variant = v;
            }
        }
        // A saved view only makes sense for the variant it was saved with.
        if !is_arg_explicitly_set(&matches, "view")
            && last.variant.as_deref() == Some(settings.variant.as_str())
        {
            if let Some(v) = last.view.filter(|v| view_fits_variant(&settings.variant, v)) {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "top") {
            if let Some(v) = last.top {
                settings.top = v;
            }
        }

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            settings
                .notices
                .push(format!("could not save {}: {}", config_path.display(), e));
        }

        settings.apply_debug()
    }

    fn apply_debug(mut self) -> Self {
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        self
    }
}

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            data_file: s.data_file.clone(),
            variant: Some(s.variant.clone()),
            // A view the variant rejects is never saved, so the next run
            // cannot restore it.
            view: view_fits_variant(&s.variant, &s.view).then(|| s.view.clone()),
            format: Some(s.format.clone()),
            top: Some(s.top),
        }
    }
}

/// `true` when `name` (the field name, not the flag spelling) came from the
/// command line rather than a default.
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

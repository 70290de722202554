mod bootstrap;
mod render;

use anyhow::{anyhow, Context, Result};
use sales_core::settings::Settings;
use sales_runtime::dashboard::{Dashboard, Variant};
use sales_runtime::data_manager::DataManager;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;
    for notice in &settings.notices {
        tracing::warn!("{}", notice);
    }

    tracing::info!("Coffee Dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Variant: {}, View: {}, Format: {}",
        settings.variant,
        settings.view,
        settings.format
    );

    let variant: Variant = settings.variant.parse().map_err(anyhow::Error::msg)?;
    let views = variant.resolve_views(&settings.view).ok_or_else(|| {
        anyhow!(
            "view '{}' is not part of the {} dashboard (choose from: all, {})",
            settings.view,
            settings.variant,
            variant
                .views()
                .iter()
                .map(|v| v.name())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })?;

    let data_path = bootstrap::discover_data_path(settings.data_file.as_deref());
    let mut data_manager = DataManager::new(&data_path);
    let table = data_manager
        .get_table()
        .with_context(|| format!("could not load transactions from {}", data_path.display()))?;

    let dashboard = Dashboard::new(table, variant).with_top_n(settings.top as usize);
    let options = dashboard.options();

    let selection = match variant {
        Variant::Overview => {
            if settings.store.is_some() {
                tracing::warn!("--store only applies to the store dashboard; ignoring it");
            }
            dashboard.overview_selection(&settings.locations, &settings.categories, &settings.months)
        }
        Variant::Store => {
            if !(settings.locations.is_empty()
                && settings.categories.is_empty()
                && settings.months.is_empty())
            {
                tracing::warn!(
                    "--location/--category/--month only apply to the overview dashboard; ignoring them"
                );
            }
            if let Some(store) = settings.store.as_deref() {
                if !options.locations.iter().any(|l| l == store) {
                    tracing::warn!(
                        "store '{}' not found; known locations: {}",
                        store,
                        options.locations.join(", ")
                    );
                }
            }
            dashboard.store_selection(settings.store.as_deref())
        }
    };

    let snapshot = dashboard.render(&selection, &views);
    tracing::debug!(
        transactions = snapshot.summary.transactions,
        views = snapshot.views.len(),
        "snapshot ready"
    );

    let output = match settings.format.as_str() {
        "json" => render::to_json(&snapshot)?,
        _ => render::to_text(&snapshot),
    };
    println!("{}", output);

    Ok(())
}

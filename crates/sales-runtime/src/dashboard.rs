//! Per-interaction view execution.
//!
//! A [`Dashboard`] holds the shared table and turns one filter selection into
//! a [`Snapshot`]: the headline summary plus the data behind each requested
//! view. Every call recomputes from scratch; nothing is kept between calls.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use sales_core::formatting::percentage;
use sales_core::models::{Dimension, FilterOptions, FilterSelection, TransactionTable};
use sales_core::settings::DEFAULT_TOP_N;
use sales_data::aggregator::{AggregateResult, Aggregator, HierarchyNode, SalesSummary};
use sales_data::filter::FilterEngine;
use serde::{Deserialize, Serialize};

// ── Variant / View ────────────────────────────────────────────────────────────

/// Which of the two dashboards is being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Chain-wide dashboard with multi-select location/category/month filters.
    Overview,
    /// Single-store dashboard.
    Store,
}

impl Variant {
    /// Views (tabs) of this dashboard, in display order.
    pub fn views(self) -> &'static [View] {
        match self {
            Variant::Overview => &[View::Overview, View::Monthly, View::Hourly, View::TopProducts],
            Variant::Store => &[View::Daily, View::Categories, View::Hierarchy],
        }
    }

    /// Resolve a `--view` argument: `"all"` or the name of one of this
    /// variant's views. `None` when the view belongs to the other variant.
    pub fn resolve_views(self, name: &str) -> Option<Vec<View>> {
        if name == "all" {
            return Some(self.views().to_vec());
        }
        let view: View = name.parse().ok()?;
        self.views().contains(&view).then(|| vec![view])
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overview" => Ok(Variant::Overview),
            "store" => Ok(Variant::Store),
            other => Err(format!("unknown dashboard variant: {}", other)),
        }
    }
}

/// One tab of a dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    /// Revenue by location and category (grouped bars).
    Overview,
    /// Monthly revenue per category (lines).
    Monthly,
    /// Transactions per hour of day (bars).
    Hourly,
    /// Best-selling products (pie).
    TopProducts,
    /// Daily revenue for one store (line).
    Daily,
    /// Revenue per category for one store (bars).
    Categories,
    /// Category → type → detail revenue (sunburst).
    Hierarchy,
}

impl View {
    pub fn name(self) -> &'static str {
        match self {
            View::Overview => "overview",
            View::Monthly => "monthly",
            View::Hourly => "hourly",
            View::TopProducts => "top-products",
            View::Daily => "daily",
            View::Categories => "categories",
            View::Hierarchy => "hierarchy",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            View::Overview => "Sales by Location and Category",
            View::Monthly => "Monthly Sales by Category",
            View::Hourly => "Transactions by Hour of Day",
            View::TopProducts => "Top Products by Revenue",
            View::Daily => "Daily Sales",
            View::Categories => "Sales by Category",
            View::Hierarchy => "Revenue by Category, Type and Product",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            View::Overview,
            View::Monthly,
            View::Hourly,
            View::TopProducts,
            View::Daily,
            View::Categories,
            View::Hierarchy,
        ]
        .into_iter()
        .find(|v| v.name() == s)
        .ok_or_else(|| format!("unknown view: {}", s))
    }
}

// ── Snapshot types ────────────────────────────────────────────────────────────

/// One pie slice: a product's revenue and its share of the slices shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareRow {
    pub label: String,
    pub value: f64,
    pub percent: f64,
}

/// Data behind a single view, shaped for its chart type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ViewData {
    /// Flat grouped aggregate (bars and lines).
    Grouped(AggregateResult),
    /// Ranked slices with percentages (pie).
    Shares(Vec<ShareRow>),
    /// Nested rollup (sunburst).
    Hierarchy(Vec<HierarchyNode>),
}

impl ViewData {
    /// `true` when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        match self {
            ViewData::Grouped(r) => r.is_empty(),
            ViewData::Shares(s) => s.is_empty(),
            ViewData::Hierarchy(h) => h.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedView {
    pub view: View,
    pub title: String,
    pub data: ViewData,
}

/// Everything one interaction produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub variant: Variant,
    pub selection: FilterSelection,
    pub summary: SalesSummary,
    pub views: Vec<RenderedView>,
}

// ── Dashboard ─────────────────────────────────────────────────────────────────

/// A dashboard bound to a loaded table.
pub struct Dashboard {
    table: Arc<TransactionTable>,
    variant: Variant,
    top_n: usize,
}

impl Dashboard {
    pub fn new(table: Arc<TransactionTable>, variant: Variant) -> Self {
        Self {
            table,
            variant,
            top_n: DEFAULT_TOP_N as usize,
        }
    }

    /// Number of slices in the top-products view.
    pub fn with_top_n(mut self, n: usize) -> Self {
        self.top_n = n;
        self
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn table(&self) -> &TransactionTable {
        &self.table
    }

    /// Choices for the filter widgets.
    pub fn options(&self) -> FilterOptions {
        FilterOptions::from_table(&self.table)
    }

    /// Overview selection from the multi-select widgets. An empty input list
    /// means the widget was left at its default of "everything selected".
    pub fn overview_selection(
        &self,
        locations: &[String],
        categories: &[String],
        months: &[String],
    ) -> FilterSelection {
        let options = self.options();
        let pick = |chosen: &[String], all: Vec<String>| {
            if chosen.is_empty() {
                all
            } else {
                chosen.to_vec()
            }
        };
        FilterSelection::new()
            .with(Dimension::StoreLocation, pick(locations, options.locations))
            .with(Dimension::ProductCategory, pick(categories, options.categories))
            .with(Dimension::Month, pick(months, options.months))
    }

    /// Store selection from the single-select widget, defaulting to the first
    /// location in the file. Unconstrained when the table is empty.
    pub fn store_selection(&self, store: Option<&str>) -> FilterSelection {
        let store = store
            .map(str::to_string)
            .or_else(|| self.options().locations.into_iter().next());
        match store {
            Some(s) => FilterSelection::single(Dimension::StoreLocation, s),
            None => FilterSelection::new(),
        }
    }

    /// Filter once, then build the summary and every requested view.
    pub fn render(&self, selection: &FilterSelection, views: &[View]) -> Snapshot {
        let filtered = FilterEngine::apply(&self.table, selection);
        tracing::debug!(
            variant = ?self.variant,
            rows = filtered.len(),
            views = views.len(),
            "rendering dashboard"
        );

        let rendered = views
            .iter()
            .map(|&view| {
                let data = match view {
                    View::Overview => {
                        ViewData::Grouped(Aggregator::sales_by_location_and_category(&filtered))
                    }
                    View::Monthly => {
                        ViewData::Grouped(Aggregator::monthly_sales_by_category(&filtered))
                    }
                    View::Hourly => ViewData::Grouped(Aggregator::hourly_transactions(&filtered)),
                    View::TopProducts => {
                        ViewData::Shares(to_shares(&Aggregator::top_products(&filtered, self.top_n)))
                    }
                    View::Daily => ViewData::Grouped(Aggregator::daily_sales(&filtered)),
                    View::Categories => ViewData::Grouped(Aggregator::category_sales(&filtered)),
                    View::Hierarchy => ViewData::Hierarchy(Aggregator::product_hierarchy(&filtered)),
                };
                RenderedView {
                    view,
                    title: view.title().to_string(),
                    data,
                }
            })
            .collect();

        Snapshot {
            variant: self.variant,
            selection: selection.clone(),
            summary: Aggregator::summarize(&filtered),
            views: rendered,
        }
    }
}

/// Pie slices with percentages of the slices' combined value.
fn to_shares(result: &AggregateResult) -> Vec<ShareRow> {
    let total = result.total();
    result
        .rows
        .iter()
        .map(|r| ShareRow {
            label: r.key.label(),
            value: r.value,
            percent: percentage(r.value, total),
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

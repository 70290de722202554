//! Group-and-reduce over filtered transactions.
//!
//! [`Aggregator::group_by`] is the generic driver; the named recipes build
//! the data behind each dashboard view.

use std::collections::BTreeMap;

use sales_core::models::{Dimension, GroupKey, Transaction};
use serde::{Deserialize, Serialize};

use crate::filter::FilteredView;

/// Numeric column a [`Reducer::Sum`] adds up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    TotalPrice,
}

impl Measure {
    fn value(self, tx: &Transaction) -> f64 {
        match self {
            Measure::TotalPrice => tx.total_price,
        }
    }
}

/// How the rows of one group collapse into a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    Sum(Measure),
    /// Number of transactions in the group.
    Count,
}

// ── AggregateResult ───────────────────────────────────────────────────────────

/// One bucket of an aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: GroupKey,
    pub value: f64,
}

/// Ordered `(key, value)` pairs produced by a grouping.
///
/// Rows come out ordered by key unless the result was re-sorted with
/// [`AggregateResult::top`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub dimensions: Vec<Dimension>,
    pub reducer: Reducer,
    pub rows: Vec<AggregateRow>,
}

impl AggregateResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of all bucket values.
    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.value).sum()
    }

    /// Largest bucket value, `0.0` for an empty result.
    pub fn max_value(&self) -> f64 {
        self.rows.iter().map(|r| r.value).fold(0.0, f64::max)
    }

    /// Keep the `n` highest-valued buckets, highest first.
    ///
    /// Equal values are ordered by key ascending so the cut is deterministic.
    pub fn top(mut self, n: usize) -> Self {
        self.rows.sort_by(|a, b| {
            b.value
                .total_cmp(&a.value)
                .then_with(|| a.key.cmp(&b.key))
        });
        self.rows.truncate(n);
        self
    }
}

// ── Hierarchy ─────────────────────────────────────────────────────────────────

/// A node of the category → type → detail rollup.
///
/// `value` always equals the sum of the children's values for inner nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub label: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Intermediate map node used while building the tree.
#[derive(Default)]
struct RollupBuilder {
    value: f64,
    children: BTreeMap<String, RollupBuilder>,
}

impl RollupBuilder {
    fn add(&mut self, path: &[&str], value: f64) {
        self.value += value;
        if let Some((head, rest)) = path.split_first() {
            self.children
                .entry((*head).to_string())
                .or_default()
                .add(rest, value);
        }
    }

    fn into_nodes(self) -> Vec<HierarchyNode> {
        self.children
            .into_iter()
            .map(|(label, b)| HierarchyNode {
                label,
                value: b.value,
                children: b.into_nodes(),
            })
            .collect()
    }
}

// ── SalesSummary ──────────────────────────────────────────────────────────────

/// Headline figures for the current selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub transactions: u64,
    pub revenue: f64,
    /// Revenue per transaction, `0.0` when there are none.
    pub average_ticket: f64,
}

// ── Aggregator ────────────────────────────────────────────────────────────────

/// Stateless helper that groups transactions and reduces each group.
pub struct Aggregator;

impl Aggregator {
    /// Group `rows` by `dimensions` (in order) and reduce each group.
    ///
    /// Buckets are ordered by key. Groups with no rows do not appear.
    pub fn group_by<'a, I>(rows: I, dimensions: &[Dimension], reducer: Reducer) -> AggregateResult
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut buckets: BTreeMap<GroupKey, f64> = BTreeMap::new();

        for tx in rows {
            let key = GroupKey(dimensions.iter().map(|d| d.key_part(tx)).collect());
            let contribution = match reducer {
                Reducer::Sum(measure) => measure.value(tx),
                Reducer::Count => 1.0,
            };
            *buckets.entry(key).or_insert(0.0) += contribution;
        }

        AggregateResult {
            dimensions: dimensions.to_vec(),
            reducer,
            rows: buckets
                .into_iter()
                .map(|(key, value)| AggregateRow { key, value })
                .collect(),
        }
    }

    /// Revenue per (location, category) for the grouped bar chart.
    pub fn sales_by_location_and_category(view: &FilteredView<'_>) -> AggregateResult {
        Self::group_by(
            view.iter(),
            &[Dimension::StoreLocation, Dimension::ProductCategory],
            Reducer::Sum(Measure::TotalPrice),
        )
    }

    /// Revenue per (month, category), months ascending.
    pub fn monthly_sales_by_category(view: &FilteredView<'_>) -> AggregateResult {
        Self::group_by(
            view.iter(),
            &[Dimension::Month, Dimension::ProductCategory],
            Reducer::Sum(Measure::TotalPrice),
        )
    }

    /// Revenue per calendar day, chronological.
    pub fn daily_sales(view: &FilteredView<'_>) -> AggregateResult {
        Self::group_by(
            view.iter(),
            &[Dimension::TransactionDate],
            Reducer::Sum(Measure::TotalPrice),
        )
    }

    /// Number of transactions per hour of day.
    pub fn hourly_transactions(view: &FilteredView<'_>) -> AggregateResult {
        Self::group_by(view.iter(), &[Dimension::Hour], Reducer::Count)
    }

    /// Revenue per product category.
    pub fn category_sales(view: &FilteredView<'_>) -> AggregateResult {
        Self::group_by(
            view.iter(),
            &[Dimension::ProductCategory],
            Reducer::Sum(Measure::TotalPrice),
        )
    }

    /// The `n` best-selling products by revenue, highest first.
    pub fn top_products(view: &FilteredView<'_>, n: usize) -> AggregateResult {
        Self::group_by(
            view.iter(),
            &[Dimension::ProductDetail],
            Reducer::Sum(Measure::TotalPrice),
        )
        .top(n)
    }

    /// Revenue rolled up category → type → detail, children ordered by label.
    pub fn product_hierarchy(view: &FilteredView<'_>) -> Vec<HierarchyNode> {
        let mut root = RollupBuilder::default();
        for tx in view.iter() {
            root.add(
                &[
                    tx.product_category.as_str(),
                    tx.product_type.as_str(),
                    tx.product_detail.as_str(),
                ],
                tx.total_price,
            );
        }
        root.into_nodes()
    }

    /// Transaction count, revenue and average ticket.
    pub fn summarize(view: &FilteredView<'_>) -> SalesSummary {
        let transactions = view.len() as u64;
        let revenue: f64 = view.iter().map(|t| t.total_price).sum();
        let average_ticket = if transactions == 0 {
            0.0
        } else {
            revenue / transactions as f64
        };
        SalesSummary {
            transactions,
            revenue,
            average_ticket,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    impl AggregateResult {
        /// Value of the bucket whose key renders as `labels`, part by part.
        fn value_for(&self, labels: &[&str]) -> Option<f64> {
            self.rows
                .iter()
                .find(|r| {
                    r.key.parts().len() == labels.len()
                        && r.key
                            .parts()
                            .iter()
                            .zip(labels)
                            .all(|(part, label)| part.to_string() == *label)
                })
                .map(|r| r.value)
        }
    }

    impl HierarchyNode {
        fn child(&self, label: &str) -> Option<&HierarchyNode> {
            self.children.iter().find(|c| c.label == label)
        }

        fn depth(&self) -> usize {
            1 + self.children.iter().map(HierarchyNode::depth).max().unwrap_or(0)
        }
    }
    use crate::filter::FilterEngine;
    use chrono::NaiveDate;
    use sales_core::models::{FilterSelection, KeyPart, TransactionTable};
    use sales_core::time_utils::month_key;

    fn make_tx(
        id: u64,
        location: &str,
        category: &str,
        product_type: &str,
        detail: &str,
        datetime: &str,
        price: f64,
    ) -> Transaction {
        let dt = chrono::NaiveDateTime::parse_from_str(datetime, "%Y-%m-%d %H:%M").unwrap();
        Transaction {
            transaction_id: id,
            store_location: location.to_string(),
            product_category: category.to_string(),
            product_type: product_type.to_string(),
            product_detail: detail.to_string(),
            transaction_date: dt.date(),
            transaction_datetime: dt,
            total_price: price,
            month: month_key(dt.date()),
            hour: chrono::Timelike::hour(&dt),
        }
    }

    /// The three-row table from the dashboard's acceptance scenario.
    fn scenario_table() -> TransactionTable {
        TransactionTable::new(
            "mem",
            vec![
                make_tx(1, "Astoria", "Coffee", "Drip", "House", "2023-01-01 08:00", 5.0),
                make_tx(2, "Astoria", "Tea", "Chai", "Spicy", "2023-01-01 09:00", 3.0),
                make_tx(3, "Hell's Kitchen", "Coffee", "Drip", "House", "2023-01-02 08:30", 4.0),
            ],
        )
    }

    fn wider_table() -> TransactionTable {
        TransactionTable::new(
            "mem",
            vec![
                make_tx(10, "Astoria", "Coffee", "Drip", "House Lg", "2023-01-03 07:10", 6.0),
                make_tx(11, "Astoria", "Coffee", "Drip", "House Rg", "2023-01-03 10:05", 4.0),
                make_tx(12, "Lower Manhattan", "Coffee", "Espresso", "Latte", "2023-02-01 07:40", 4.5),
                make_tx(13, "Lower Manhattan", "Bakery", "Scone", "Oatmeal Scone", "2023-02-11 09:00", 3.25),
                make_tx(14, "Hell's Kitchen", "Tea", "Chai", "Spicy", "2023-03-15 07:59", 5.0),
                make_tx(15, "Hell's Kitchen", "Bakery", "Scone", "Oatmeal Scone", "2023-03-20 10:30", 3.25),
                make_tx(16, "Astoria", "Tea", "Chai", "Spicy", "2023-01-09 15:00", 2.5),
            ],
        )
    }

    // ── scenario ──────────────────────────────────────────────────────────────

    #[test]
    fn test_scenario_filter_location_group_by_category() {
        let t = scenario_table();
        let view = FilterEngine::apply(&t, &FilterSelection::single(Dimension::StoreLocation, "Astoria"));
        let result = Aggregator::group_by(
            view.iter(),
            &[Dimension::ProductCategory],
            Reducer::Sum(Measure::TotalPrice),
        );

        assert_eq!(result.len(), 2);
        assert_eq!(result.value_for(&["Coffee"]), Some(5.0));
        assert_eq!(result.value_for(&["Tea"]), Some(3.0));
    }

    #[test]
    fn test_scenario_filter_category_group_by_location() {
        let t = scenario_table();
        let view = FilterEngine::apply(&t, &FilterSelection::single(Dimension::ProductCategory, "Coffee"));
        let result = Aggregator::group_by(
            view.iter(),
            &[Dimension::StoreLocation],
            Reducer::Sum(Measure::TotalPrice),
        );

        let keys: Vec<String> = result.rows.iter().map(|r| r.key.label()).collect();
        assert_eq!(keys, vec!["Astoria", "Hell's Kitchen"]);
        assert_eq!(result.value_for(&["Astoria"]), Some(5.0));
        assert_eq!(result.value_for(&["Hell's Kitchen"]), Some(4.0));
    }

    // ── group_by ──────────────────────────────────────────────────────────────

    #[test]
    fn test_group_by_empty_input() {
        let result = Aggregator::group_by(std::iter::empty(), &[Dimension::Hour], Reducer::Count);
        assert!(result.is_empty());
        assert_eq!(result.total(), 0.0);
        assert_eq!(result.max_value(), 0.0);
    }

    #[test]
    fn test_group_by_three_dimensions() {
        let t = wider_table();
        let result = Aggregator::group_by(
            t.rows(),
            &[
                Dimension::ProductCategory,
                Dimension::ProductType,
                Dimension::ProductDetail,
            ],
            Reducer::Sum(Measure::TotalPrice),
        );
        assert_eq!(result.value_for(&["Bakery", "Scone", "Oatmeal Scone"]), Some(6.5));
        assert_eq!(result.value_for(&["Coffee", "Drip", "House Lg"]), Some(6.0));
        assert_eq!(result.value_for(&["Coffee", "Drip"]), None);
    }

    #[test]
    fn test_location_category_absent_groups_not_zero_filled() {
        let t = wider_table();
        let result = Aggregator::sales_by_location_and_category(&FilteredView::all(&t));
        // Lower Manhattan sold no tea: no bucket at all.
        assert_eq!(result.value_for(&["Lower Manhattan", "Tea"]), None);
        assert_eq!(result.value_for(&["Astoria", "Coffee"]), Some(10.0));
        assert!(result.rows.iter().all(|r| r.value > 0.0));
    }

    #[test]
    fn test_split_after_equals_filter_before() {
        let t = wider_table();
        let full = Aggregator::sales_by_location_and_category(&FilteredView::all(&t));

        for location in t.distinct_values(Dimension::StoreLocation) {
            let view = FilterEngine::apply(&t, &FilterSelection::single(Dimension::StoreLocation, location.clone()));
            let per_location = Aggregator::category_sales(&view);
            for row in &per_location.rows {
                let category = row.key.label();
                let from_full = full.value_for(&[location.as_str(), category.as_str()]).unwrap();
                assert!((from_full - row.value).abs() < 1e-9);
            }
            let full_subtotal: f64 = full
                .rows
                .iter()
                .filter(|r| r.key.parts()[0] == KeyPart::Text(location.clone()))
                .map(|r| r.value)
                .sum();
            assert!((full_subtotal - per_location.total()).abs() < 1e-9);
        }
    }

    // ── time views ────────────────────────────────────────────────────────────

    #[test]
    fn test_monthly_sales_chronological() {
        let t = wider_table();
        let result = Aggregator::monthly_sales_by_category(&FilteredView::all(&t));
        let months: Vec<String> = result.rows.iter().map(|r| r.key.parts()[0].to_string()).collect();
        let mut sorted = months.clone();
        sorted.sort();
        assert_eq!(months, sorted);
        assert_eq!(result.value_for(&["2023-01", "Tea"]), Some(2.5));
        assert_eq!(result.value_for(&["2023-03", "Bakery"]), Some(3.25));
    }

    #[test]
    fn test_daily_sales_by_date() {
        let t = wider_table();
        let view = FilterEngine::apply(&t, &FilterSelection::single(Dimension::StoreLocation, "Astoria"));
        let result = Aggregator::daily_sales(&view);
        assert_eq!(result.len(), 2);
        assert_eq!(
            result.rows[0].key.parts()[0],
            KeyPart::Date(NaiveDate::from_ymd_opt(2023, 1, 3).unwrap())
        );
        assert_eq!(result.value_for(&["2023-01-03"]), Some(10.0));
        assert_eq!(result.value_for(&["2023-01-09"]), Some(2.5));
    }

    #[test]
    fn test_hourly_transactions_counts_and_numeric_order() {
        let t = wider_table();
        let result = Aggregator::hourly_transactions(&FilteredView::all(&t));
        let hours: Vec<KeyPart> = result.rows.iter().map(|r| r.key.parts()[0].clone()).collect();
        assert_eq!(
            hours,
            vec![
                KeyPart::Hour(7),
                KeyPart::Hour(9),
                KeyPart::Hour(10),
                KeyPart::Hour(15)
            ]
        );
        assert_eq!(result.value_for(&["7"]), Some(3.0));
        assert_eq!(result.value_for(&["10"]), Some(2.0));
        assert_eq!(result.total(), t.len() as f64);
        assert_eq!(result.reducer, Reducer::Count);
    }

    // ── top products ──────────────────────────────────────────────────────────

    #[test]
    fn test_top_products_sorted_and_truncated() {
        let rows: Vec<Transaction> = (0..40)
            .map(|i| {
                make_tx(
                    i,
                    "Astoria",
                    "Coffee",
                    "Drip",
                    &format!("Product {:02}", i % 20),
                    "2023-01-01 08:00",
                    (i % 7) as f64 + 1.0,
                )
            })
            .collect();
        let t = TransactionTable::new("mem", rows);
        let result = Aggregator::top_products(&FilteredView::all(&t), 15);

        assert_eq!(result.len(), 15);
        assert!(result.rows.windows(2).all(|w| w[0].value >= w[1].value));
    }

    #[test]
    fn test_top_products_fewer_than_n() {
        let t = wider_table();
        let result = Aggregator::top_products(&FilteredView::all(&t), 15);
        assert_eq!(result.len(), 5);
        assert_eq!(result.rows[0].key.label(), "Spicy");
        assert_eq!(result.rows[0].value, 7.5);
    }

    #[test]
    fn test_top_products_ties_broken_by_key() {
        let t = TransactionTable::new(
            "mem",
            vec![
                make_tx(1, "Astoria", "Tea", "Chai", "Zeta", "2023-01-01 08:00", 2.0),
                make_tx(2, "Astoria", "Tea", "Chai", "Alpha", "2023-01-01 08:00", 2.0),
                make_tx(3, "Astoria", "Tea", "Chai", "Mid", "2023-01-01 08:00", 2.0),
            ],
        );
        let result = Aggregator::top_products(&FilteredView::all(&t), 2);
        let labels: Vec<String> = result.rows.iter().map(|r| r.key.label()).collect();
        assert_eq!(labels, vec!["Alpha", "Mid"]);
    }

    // ── hierarchy ─────────────────────────────────────────────────────────────

    #[test]
    fn test_product_hierarchy_rollup() {
        let t = wider_table();
        let tree = Aggregator::product_hierarchy(&FilteredView::all(&t));

        let labels: Vec<&str> = tree.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["Bakery", "Coffee", "Tea"]);

        let coffee = &tree[1];
        assert!((coffee.value - 14.5).abs() < 1e-9);
        assert_eq!(coffee.depth(), 3);
        let drip = coffee.child("Drip").unwrap();
        assert!((drip.value - 10.0).abs() < 1e-9);
        assert!(drip.child("House Lg").unwrap().is_leaf());

        fn check(node: &HierarchyNode) {
            if !node.is_leaf() {
                let sum: f64 = node.children.iter().map(|c| c.value).sum();
                assert!((sum - node.value).abs() < 1e-9, "{} does not roll up", node.label);
                node.children.iter().for_each(check);
            }
        }
        tree.iter().for_each(check);
    }

    #[test]
    fn test_product_hierarchy_empty_view() {
        assert!(Aggregator::product_hierarchy(&FilteredView::default()).is_empty());
    }

    // ── summary ───────────────────────────────────────────────────────────────

    #[test]
    fn test_summarize() {
        let t = scenario_table();
        let summary = Aggregator::summarize(&FilteredView::all(&t));
        assert_eq!(summary.transactions, 3);
        assert!((summary.revenue - 12.0).abs() < 1e-9);
        assert!((summary.average_ticket - 4.0).abs() < 1e-9);

        let empty = Aggregator::summarize(&FilteredView::default());
        assert_eq!(empty, SalesSummary::default());
    }

    #[test]
    fn test_empty_selection_gives_empty_aggregates() {
        let t = wider_table();
        let sel = FilterSelection::new().with(Dimension::StoreLocation, Vec::<String>::new());
        let view = FilterEngine::apply(&t, &sel);
        assert!(Aggregator::sales_by_location_and_category(&view).is_empty());
        assert!(Aggregator::monthly_sales_by_category(&view).is_empty());
        assert!(Aggregator::hourly_transactions(&view).is_empty());
        assert!(Aggregator::top_products(&view, 15).is_empty());
    }
}

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::path::PathBuf;

/// A single sale read from the transactions file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Identifier from the source file; unique per row but not sequential.
    pub transaction_id: u64,
    pub store_location: String,
    pub product_category: String,
    pub product_type: String,
    pub product_detail: String,
    pub transaction_date: NaiveDate,
    pub transaction_datetime: NaiveDateTime,
    /// Line total (quantity × unit price).
    pub total_price: f64,
    /// Derived `"YYYY-MM"` bucket of `transaction_date`.
    pub month: String,
    /// Derived hour-of-day of `transaction_datetime`.
    pub hour: u32,
}

// ── Dimension ──────────────────────────────────────────────────────────────────

/// A categorical column that can be filtered on or grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    StoreLocation,
    ProductCategory,
    ProductType,
    ProductDetail,
    Month,
    Hour,
    TransactionDate,
}

impl Dimension {
    /// Column name as it appears in the source file.
    pub fn column_name(self) -> &'static str {
        match self {
            Dimension::StoreLocation => "store_location",
            Dimension::ProductCategory => "product_category",
            Dimension::ProductType => "product_type",
            Dimension::ProductDetail => "product_detail",
            Dimension::Month => "month",
            Dimension::Hour => "hour",
            Dimension::TransactionDate => "transaction_date",
        }
    }

    /// Typed group-key component for `tx`.
    pub fn key_part(self, tx: &Transaction) -> KeyPart {
        match self {
            Dimension::Hour => KeyPart::Hour(tx.hour),
            Dimension::TransactionDate => KeyPart::Date(tx.transaction_date),
            text => KeyPart::Text(text.text_value(tx).into_owned()),
        }
    }

    /// Textual value of `tx` in this dimension, as matched by filters.
    ///
    /// Borrowed for the string columns; hours and dates are rendered the same
    /// way [`KeyPart`] displays them.
    pub fn text_value(self, tx: &Transaction) -> Cow<'_, str> {
        match self {
            Dimension::StoreLocation => Cow::Borrowed(&tx.store_location),
            Dimension::ProductCategory => Cow::Borrowed(&tx.product_category),
            Dimension::ProductType => Cow::Borrowed(&tx.product_type),
            Dimension::ProductDetail => Cow::Borrowed(&tx.product_detail),
            Dimension::Month => Cow::Borrowed(&tx.month),
            Dimension::Hour => Cow::Owned(tx.hour.to_string()),
            Dimension::TransactionDate => {
                Cow::Owned(tx.transaction_date.format("%Y-%m-%d").to_string())
            }
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

// ── Group keys ─────────────────────────────────────────────────────────────────

/// One component of a group key.
///
/// Typed so that hours sort numerically and dates chronologically rather
/// than by their string rendering. Serialized bare for output only; a date
/// and a product name are indistinguishable once written out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum KeyPart {
    Text(String),
    Hour(u32),
    Date(NaiveDate),
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Text(s) => f.write_str(s),
            KeyPart::Hour(h) => write!(f, "{}", h),
            KeyPart::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// Values identifying one aggregate bucket, one part per grouping dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct GroupKey(pub Vec<KeyPart>);

impl GroupKey {
    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    /// Human-readable label, parts joined with `" / "`.
    pub fn label(&self) -> String {
        self.0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

// ── TransactionTable ───────────────────────────────────────────────────────────

/// All transactions loaded from one file, in file order.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionTable {
    source: PathBuf,
    rows: Vec<Transaction>,
}

impl TransactionTable {
    pub fn new(source: impl Into<PathBuf>, rows: Vec<Transaction>) -> Self {
        Self {
            source: source.into(),
            rows,
        }
    }

    /// Path (or stream name) the rows were read from.
    pub fn source(&self) -> &std::path::Path {
        &self.source
    }

    pub fn rows(&self) -> &[Transaction] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct values of `dim` in order of first appearance.
    pub fn distinct_values(&self, dim: Dimension) -> Vec<String> {
        let mut seen: HashSet<Cow<'_, str>> = HashSet::new();
        let mut out = Vec::new();
        for tx in &self.rows {
            let v = dim.text_value(tx);
            if !seen.contains(&v) {
                out.push(v.to_string());
                seen.insert(v);
            }
        }
        out
    }
}

// ── FilterSelection ────────────────────────────────────────────────────────────

/// Accepted values per dimension.
///
/// A dimension that is not present is unconstrained. A dimension present with
/// an empty set accepts nothing, which is how "everything deselected" reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    criteria: BTreeMap<Dimension, BTreeSet<String>>,
}

impl FilterSelection {
    /// An unconstrained selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict `dim` to `values` (replacing any earlier restriction).
    pub fn with<I, S>(mut self, dim: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(dim, values);
        self
    }

    /// Restrict `dim` to exactly one value.
    pub fn single(dim: Dimension, value: impl Into<String>) -> Self {
        Self::new().with(dim, [value.into()])
    }

    /// Every location, category and month present in `table` selected, the
    /// default state of the overview widgets.
    pub fn all_of(table: &TransactionTable) -> Self {
        let options = FilterOptions::from_table(table);
        Self::new()
            .with(Dimension::StoreLocation, options.locations)
            .with(Dimension::ProductCategory, options.categories)
            .with(Dimension::Month, options.months)
    }

    pub fn set<I, S>(&mut self, dim: Dimension, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.criteria
            .insert(dim, values.into_iter().map(Into::into).collect());
    }

    /// Drop any restriction on `dim`.
    pub fn clear(&mut self, dim: Dimension) {
        self.criteria.remove(&dim);
    }

    /// Accepted values for `dim`, or `None` when unconstrained.
    pub fn values(&self, dim: Dimension) -> Option<&BTreeSet<String>> {
        self.criteria.get(&dim)
    }

    /// `true` when `tx` satisfies every restriction.
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.criteria
            .iter()
            .all(|(dim, accepted)| accepted.contains(&*dim.text_value(tx)))
    }

    /// `true` when some dimension has an empty accepted set.
    pub fn is_unsatisfiable(&self) -> bool {
        self.criteria.values().any(BTreeSet::is_empty)
    }

    pub fn dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.criteria.keys().copied()
    }
}

// ── FilterOptions ──────────────────────────────────────────────────────────────

/// Choices offered by the filter widgets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Store locations in first-appearance order.
    pub locations: Vec<String>,
    /// Product categories in first-appearance order.
    pub categories: Vec<String>,
    /// Months sorted ascending.
    pub months: Vec<String>,
}

impl FilterOptions {
    pub fn from_table(table: &TransactionTable) -> Self {
        let mut months = table.distinct_values(Dimension::Month);
        months.sort();
        Self {
            locations: table.distinct_values(Dimension::StoreLocation),
            categories: table.distinct_values(Dimension::ProductCategory),
            months,
        }
    }
}

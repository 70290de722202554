//! Row filtering by dimension membership.

use sales_core::models::{FilterSelection, Transaction, TransactionTable};
use tracing::debug;

/// Rows of a table that passed a [`FilterSelection`], in table order.
#[derive(Debug, Clone, Default)]
pub struct FilteredView<'a> {
    rows: Vec<&'a Transaction>,
}

impl<'a> FilteredView<'a> {
    /// Every row of `table`, unfiltered.
    pub fn all(table: &'a TransactionTable) -> Self {
        Self {
            rows: table.rows().iter().collect(),
        }
    }

    pub fn rows(&self) -> &[&'a Transaction] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Transaction> + '_ {
        self.rows.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Narrow this view further.
    pub fn refine(&self, selection: &FilterSelection) -> FilteredView<'a> {
        FilteredView {
            rows: self
                .rows
                .iter()
                .copied()
                .filter(|tx| selection.matches(tx))
                .collect(),
        }
    }
}

/// Stateless helper applying selections to a table.
pub struct FilterEngine;

impl FilterEngine {
    /// Rows whose value lies in every restricted dimension's accepted set.
    ///
    /// An empty accepted set yields an empty view; that is the expected
    /// outcome of deselecting everything, not an error.
    pub fn apply<'a>(table: &'a TransactionTable, selection: &FilterSelection) -> FilteredView<'a> {
        if selection.is_unsatisfiable() {
            debug!("selection has an empty dimension; no rows match");
            return FilteredView::default();
        }

        let view = FilteredView::all(table).refine(selection);
        debug!(
            matched = view.len(),
            total = table.len(),
            "filter applied"
        );
        view
    }
}

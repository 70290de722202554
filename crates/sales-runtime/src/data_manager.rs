//! Load-once cache for the transaction table.
//!
//! The first [`DataManager::get_table`] reads the file; every later call
//! hands back the same shared table without touching the disk. The cache is
//! never refreshed on its own. [`DataManager::invalidate_cache`] drops it and
//! [`DataManager::reload`] replaces it with a fresh read.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sales_core::error::Result;
use sales_core::models::TransactionTable;
use sales_data::reader::load_transactions;

/// Process-scoped cache keyed by a single data path.
///
/// # Example
/// ```no_run
/// use sales_runtime::data_manager::DataManager;
///
/// let mut mgr = DataManager::new("coffee_shop_clean.csv");
/// let table = mgr.get_table()?;
/// println!("{} transactions", table.len());
/// # Ok::<(), sales_runtime::core::LoadError>(())
/// ```
pub struct DataManager {
    /// File the table is loaded from.
    data_path: PathBuf,
    /// Loaded table, shared with every caller.
    cache: Option<Arc<TransactionTable>>,
    /// Number of reads performed so far.
    load_count: u32,
}

impl DataManager {
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            cache: None,
            load_count: 0,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// The cached table, loading it on first use.
    ///
    /// A load failure is returned as-is and leaves the cache empty; nothing is
    /// retried.
    pub fn get_table(&mut self) -> Result<Arc<TransactionTable>> {
        if let Some(table) = &self.cache {
            tracing::debug!("returning cached transaction table");
            return Ok(Arc::clone(table));
        }
        self.load()
    }

    /// Read the file again regardless of the cache and replace it.
    pub fn reload(&mut self) -> Result<Arc<TransactionTable>> {
        self.load()
    }

    /// Discard the cached table so the next [`DataManager::get_table`] reads
    /// the file again.
    pub fn invalidate_cache(&mut self) {
        self.cache = None;
        tracing::debug!("cache invalidated");
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    pub fn load_count(&self) -> u32 {
        self.load_count
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn load(&mut self) -> Result<Arc<TransactionTable>> {
        self.load_count += 1;
        let table = Arc::new(load_transactions(&self.data_path)?);
        tracing::debug!(
            rows = table.len(),
            load = self.load_count,
            "transaction cache populated"
        );
        self.cache = Some(Arc::clone(&table));
        Ok(table)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use sales_core::error::LoadError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CSV: &str = "\
transaction_id,transaction_date,store_location,product_category,product_type,product_detail,transaction_datetime,total_price
1,2023-01-01,Astoria,Coffee,Drip,House,2023-01-01 07:00:00,5.0
2,2023-01-01,Astoria,Tea,Chai,Spicy,2023-01-01 08:00:00,3.0
";

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    // ── cache miss on construction ────────────────────────────────────────

    #[test]
    fn test_nothing_cached_before_first_call() {
        let mgr = DataManager::new("coffee_shop_clean.csv");
        assert!(!mgr.is_cached());
        assert_eq!(mgr.load_count(), 0);
        assert_eq!(mgr.data_path(), Path::new("coffee_shop_clean.csv"));
    }

    // ── load once ─────────────────────────────────────────────────────────

    #[test]
    fn test_second_call_served_from_cache() {
        let file = csv_file(CSV);
        let mut mgr = DataManager::new(file.path());

        let first = mgr.get_table().expect("load");
        let second = mgr.get_table().expect("cached");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(mgr.load_count(), 1);
        assert_eq!(first.len(), 2);
        assert!(mgr.is_cached());
    }

    #[test]
    fn test_cache_not_refreshed_when_file_changes() {
        let mut file = csv_file(CSV);
        let mut mgr = DataManager::new(file.path());
        let before = mgr.get_table().unwrap();

        file.write_all(b"3,2023-01-02,Astoria,Tea,Chai,Spicy,2023-01-02 09:00:00,3.0\n")
            .unwrap();
        file.flush().unwrap();

        let after = mgr.get_table().unwrap();
        assert_eq!(after.len(), before.len());
    }

    // ── invalidation / reload ─────────────────────────────────────────────

    #[test]
    fn test_invalidate_cache_forces_reload() {
        let file = csv_file(CSV);
        let mut mgr = DataManager::new(file.path());

        let first = mgr.get_table().unwrap();
        mgr.invalidate_cache();
        assert!(!mgr.is_cached());

        let second = mgr.get_table().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
        assert_eq!(mgr.load_count(), 2);
    }

    #[test]
    fn test_reload_bypasses_cache_and_replaces_it() {
        let file = csv_file(CSV);
        let mut mgr = DataManager::new(file.path());

        let first = mgr.get_table().unwrap();
        let reloaded = mgr.reload().unwrap();
        let cached = mgr.get_table().unwrap();

        assert_eq!(*first, *reloaded);
        assert!(Arc::ptr_eq(&reloaded, &cached));
        assert_eq!(mgr.load_count(), 2);
    }

    // ── failures ──────────────────────────────────────────────────────────

    #[test]
    fn test_missing_file_is_load_error_and_not_cached() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut mgr = DataManager::new(dir.path().join("absent.csv"));

        assert!(matches!(mgr.get_table(), Err(LoadError::FileRead { .. })));
        assert!(!mgr.is_cached());
    }

    #[test]
    fn test_unparseable_timestamp_is_load_error() {
        let file = csv_file(
            "transaction_id,transaction_date,store_location,product_category,product_type,product_detail,transaction_datetime,total_price\n\
             1,soon,Astoria,Coffee,Drip,House,2023-01-01 07:00:00,5.0\n",
        );
        let mut mgr = DataManager::new(file.path());
        assert!(matches!(
            mgr.get_table(),
            Err(LoadError::TimestampParse { .. })
        ));
    }
}

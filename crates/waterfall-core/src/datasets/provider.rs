//! Source of portfolio aggregates.
//!
//! The allocation engine only ever sees a [`PortfolioAggregate`]; where the
//! loan records live is a provider concern.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::datasets::cache::DatasetCache;
use crate::datasets::records::{summarize_records, AggregateFilter, LoanRecord};
use crate::error::WaterfallError;
use crate::portfolio::PortfolioAggregate;
use crate::WaterfallResult;

/// Anything that can reduce a named dataset to an aggregate.
pub trait AggregateProvider {
    /// Unknown datasets are `NotFound`; backend failures are `ProviderError`.
    fn fetch_aggregate(
        &self,
        dataset_name: &str,
        filter: &AggregateFilter,
    ) -> WaterfallResult<PortfolioAggregate>;

    /// Dataset names this provider can serve.
    fn dataset_names(&self) -> Vec<String>;
}

/// Datasets held as in-memory record lists.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAggregateProvider {
    datasets: BTreeMap<String, Vec<LoanRecord>>,
}

impl InMemoryAggregateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a dataset. Returns the records it replaced, if any.
    pub fn insert_dataset(
        &mut self,
        name: impl Into<String>,
        records: Vec<LoanRecord>,
    ) -> Option<Vec<LoanRecord>> {
        self.datasets.insert(name.into(), records)
    }

    pub fn remove_dataset(&mut self, name: &str) -> Option<Vec<LoanRecord>> {
        self.datasets.remove(name)
    }

    pub fn records(&self, name: &str) -> Option<&[LoanRecord]> {
        self.datasets.get(name).map(Vec::as_slice)
    }
}

impl AggregateProvider for InMemoryAggregateProvider {
    fn fetch_aggregate(
        &self,
        dataset_name: &str,
        filter: &AggregateFilter,
    ) -> WaterfallResult<PortfolioAggregate> {
        let records = self
            .datasets
            .get(dataset_name)
            .ok_or_else(|| WaterfallError::NotFound(format!("dataset '{dataset_name}'")))?;
        summarize_records(records, filter)
    }

    fn dataset_names(&self) -> Vec<String> {
        self.datasets.keys().cloned().collect()
    }
}

/// Provider front with an explicit aggregate cache.
///
/// Each (dataset, filter) pair is cached separately. The keys issued for a
/// dataset are tracked, so `invalidate(dataset)` drops exactly that dataset's
/// views whatever characters its name contains.
#[derive(Debug)]
pub struct CachedAggregateProvider<P> {
    inner: P,
    cache: DatasetCache<PortfolioAggregate>,
    keys_by_dataset: BTreeMap<String, BTreeSet<String>>,
}

impl<P: AggregateProvider> CachedAggregateProvider<P> {
    pub fn new(inner: P) -> Self {
        Self::with_cache(inner, DatasetCache::new())
    }

    /// Wrap `inner` with a preconfigured cache (e.g. one with a max age).
    /// Entries already in `cache` are only dropped by `invalidate_all`.
    pub fn with_cache(inner: P, cache: DatasetCache<PortfolioAggregate>) -> Self {
        Self {
            inner,
            cache,
            keys_by_dataset: BTreeMap::new(),
        }
    }

    pub fn aggregate(
        &mut self,
        dataset_name: &str,
        filter: &AggregateFilter,
    ) -> WaterfallResult<PortfolioAggregate> {
        let key = cache_key(dataset_name, filter)?;
        let inner = &self.inner;
        let value = self
            .cache
            .get_or_fetch(&key, || inner.fetch_aggregate(dataset_name, filter))?;
        self.track(dataset_name, key);
        Ok(value)
    }

    pub fn refresh(
        &mut self,
        dataset_name: &str,
        filter: &AggregateFilter,
    ) -> WaterfallResult<PortfolioAggregate> {
        let key = cache_key(dataset_name, filter)?;
        let inner = &self.inner;
        let value = self
            .cache
            .refresh(&key, || inner.fetch_aggregate(dataset_name, filter))?;
        self.track(dataset_name, key);
        Ok(value)
    }

    /// Drop all cached views of one dataset. Returns how many went.
    pub fn invalidate(&mut self, dataset_name: &str) -> usize {
        let keys = self.keys_by_dataset.remove(dataset_name).unwrap_or_default();
        let dropped = keys.iter().filter(|k| self.cache.invalidate(k.as_str())).count();
        debug!(dataset = dataset_name, dropped, "dataset invalidated");
        dropped
    }

    pub fn invalidate_all(&mut self) {
        self.keys_by_dataset.clear();
        self.cache.invalidate_all();
    }

    pub fn cache(&self) -> &DatasetCache<PortfolioAggregate> {
        &self.cache
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Mutable access to the wrapped provider. Callers changing data behind
    /// it are responsible for invalidating.
    pub fn inner_mut(&mut self) -> &mut P {
        &mut self.inner
    }
}

impl<P> CachedAggregateProvider<P> {
    fn track(&mut self, dataset_name: &str, key: String) {
        self.keys_by_dataset
            .entry(dataset_name.to_string())
            .or_default()
            .insert(key);
    }
}

/// JSON of the (name, filter) pair. String escaping keeps distinct pairs
/// distinct, so no dataset name can collide with another dataset's view.
fn cache_key(dataset_name: &str, filter: &AggregateFilter) -> WaterfallResult<String> {
    Ok(serde_json::to_string(&(dataset_name, filter))?)
}

//! # Fetcher Module
//!
//! The query/pagination core: a [`QueryClient`] owning an explicit cache of
//! JSON results keyed by string, and a [`DataFetcher`] that runs a fetch
//! closure through that cache, then sorts and slices the resolved sequence
//! into pages.
//!
//! Per fetcher instance the lifecycle is `Idle -> Loading -> (Success |
//! Error)`; a resolved state only goes back through `Loading` on an explicit
//! [`DataFetcher::refetch`]. Fetch failures surface as a non-loading error
//! state with no data and are never retried automatically.

use std::cmp::Ordering;
use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::db;

/// Default records per page when the caller doesn't pick one
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Page sizes offered by the report surface
pub const PAGE_SIZES: [usize; 5] = [5, 10, 25, 50, 100];

/// A fetch result: either one object or an ordered sequence.
///
/// Navigation and the page label only apply to `Many`; a `Single` payload is
/// passed through as a one-element sequence when pagination is off.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<T> {
    Single(T),
    Many(Vec<T>),
}

/// Query lifecycle for one fetcher instance
#[derive(Debug, Clone)]
pub enum QueryState<T> {
    Idle,
    Loading,
    Success(Payload<T>),
    Error(String),
}

pub type FetchFn<T> = Box<dyn Fn() -> Result<Payload<T>>>;
pub type SortFn<T> = Box<dyn Fn(&T, &T) -> Ordering>;

/// Explicit request coordinator: one cache map, keyed by cache key.
///
/// Results are remembered in memory for the life of the client; with
/// persistence enabled they are also written through to the SQLite cache so
/// repeated invocations within the TTL skip the network entirely.
pub struct QueryClient {
    cache: HashMap<String, Value>,
    persist: bool,
}

impl QueryClient {
    /// In-memory cache only
    pub fn new() -> Self {
        QueryClient {
            cache: HashMap::new(),
            persist: false,
        }
    }

    /// Cache backed by the SQLite layer in [`crate::db`]
    pub fn with_persistence() -> Self {
        QueryClient {
            cache: HashMap::new(),
            persist: true,
        }
    }

    fn load(&mut self, key: &str) -> Option<Value> {
        if let Some(value) = self.cache.get(key) {
            return Some(value.clone());
        }

        if self.persist
            && let Ok(Some(raw)) = db::get_api_cache(key)
            && let Ok(value) = serde_json::from_str::<Value>(&raw)
        {
            self.cache.insert(key.to_string(), value.clone());
            return Some(value);
        }

        None
    }

    fn store(&mut self, key: &str, value: Value) {
        if self.persist {
            // Cache write failures are non-fatal; the next run just refetches
            let _ = db::set_api_cache(key, &value.to_string(), db::cache_ttl_seconds());
        }
        self.cache.insert(key.to_string(), value);
    }

    /// Forget one key in both cache layers
    pub fn invalidate(&mut self, key: &str) {
        self.cache.remove(key);
        if self.persist {
            let _ = db::invalidate_api_cache(key);
        }
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.cache.clear();
        if self.persist {
            let _ = db::clear_api_cache();
        }
    }

    /// Whether a key currently resolves from cache
    pub fn contains(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Cached fetch plus client-side pagination and sorting over the result.
///
/// Construction takes the cache key and the fetch closure; pagination, sort
/// order and auto-execution gating are layered on with the `with_*` methods.
pub struct DataFetcher<T> {
    key: String,
    query_fn: FetchFn<T>,
    paginated: bool,
    page_size: usize,
    offset: usize,
    sort: Option<SortFn<T>>,
    enabled: bool,
    state: QueryState<T>,
}

impl<T> DataFetcher<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    pub fn new(key: impl Into<String>, query_fn: FetchFn<T>) -> Self {
        DataFetcher {
            key: key.into(),
            query_fn,
            paginated: false,
            page_size: DEFAULT_PAGE_SIZE,
            offset: 0,
            sort: None,
            enabled: true,
            state: QueryState::Idle,
        }
    }

    /// Enable pagination with the given page size
    pub fn with_pagination(mut self, page_size: usize) -> Self {
        self.paginated = true;
        self.page_size = page_size.max(1);
        self
    }

    /// Sort the resolved sequence with this comparator before slicing
    pub fn with_sort(mut self, sort: SortFn<T>) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Gate automatic execution; a disabled fetcher only runs on `refetch`
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> &QueryState<T> {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, QueryState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            QueryState::Error(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Length of the resolved sequence; `None` until a sequence is loaded
    pub fn sequence_len(&self) -> Option<usize> {
        match &self.state {
            QueryState::Success(Payload::Many(rows)) => Some(rows.len()),
            _ => None,
        }
    }

    /// Run the query unless auto-execution is disabled.
    ///
    /// Cache hit for the key short-circuits the closure entirely. A failed
    /// query stays failed; only `refetch` leaves the error state.
    pub fn execute(&mut self, client: &mut QueryClient) {
        if !self.enabled || matches!(self.state, QueryState::Error(_)) {
            return;
        }
        self.run(client);
    }

    /// Invalidate the key and re-run, even when auto-execution is disabled.
    /// This is the only way to re-issue the query without rebuilding the
    /// fetcher.
    pub fn refetch(&mut self, client: &mut QueryClient) {
        client.invalidate(&self.key);
        self.state = QueryState::Idle;
        self.run(client);
    }

    fn run(&mut self, client: &mut QueryClient) {
        // A fetch already in flight for this key is never doubled up
        if self.is_loading() {
            return;
        }
        self.state = QueryState::Loading;

        if let Some(value) = client.load(&self.key) {
            match payload_from_value::<T>(value) {
                Ok(payload) => {
                    self.state = QueryState::Success(payload);
                    return;
                }
                // Cached value no longer matches the expected shape
                Err(_) => client.invalidate(&self.key),
            }
        }

        match (self.query_fn)() {
            Ok(payload) => {
                if let Ok(value) = payload_to_value(&payload) {
                    client.store(&self.key, value);
                }
                self.state = QueryState::Success(payload);
            }
            Err(e) => {
                self.state = QueryState::Error(format!("{e:#}"));
            }
        }
    }

    /// Advance one page; no-op at or past the last page start
    pub fn next(&mut self) {
        if !self.paginated {
            return;
        }
        if let Some(len) = self.sequence_len() {
            if self.offset + self.page_size >= len {
                return;
            }
            self.offset += self.page_size;
        }
    }

    /// Step back one page; no-op at offset 0
    pub fn prev(&mut self) {
        if !self.paginated || self.offset == 0 {
            return;
        }
        self.offset = self.offset.saturating_sub(self.page_size);
    }

    /// Jump to a zero-based page index; out-of-range indexes are no-ops
    pub fn goto(&mut self, index: i64) {
        if !self.paginated || index < 0 {
            return;
        }
        if let Some(len) = self.sequence_len() {
            let start = (index as usize).saturating_mul(self.page_size);
            if start >= len {
                return;
            }
            self.offset = start;
        }
    }

    /// Change the page size and reset to the first page
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.offset = 0;
    }

    /// Replace the comparator without touching the resolved data
    pub fn set_sort(&mut self, sort: Option<SortFn<T>>) {
        self.sort = sort;
    }

    /// Reset pagination and sort to defaults.
    ///
    /// The report view calls this when the filter selection changes, before
    /// the superseding fetch resolves.
    pub fn reset_view(&mut self) {
        self.offset = 0;
        self.sort = None;
    }

    /// The rows to display right now.
    ///
    /// With pagination on and a sequence resolved: stable-sorts in place when
    /// a comparator is set, then returns the slice starting at the current
    /// offset, at most one page long. With pagination off the full payload
    /// comes back, a single object as a one-element sequence. Unresolved or
    /// failed queries yield an empty page.
    pub fn current_page(&mut self) -> Vec<T> {
        let Self {
            state,
            sort,
            paginated,
            page_size,
            offset,
            ..
        } = self;

        match state {
            QueryState::Success(Payload::Many(rows)) => {
                if let Some(cmp) = sort.as_deref() {
                    rows.sort_by(|a, b| cmp(a, b));
                }
                if *paginated {
                    rows.iter().skip(*offset).take(*page_size).cloned().collect()
                } else {
                    rows.clone()
                }
            }
            QueryState::Success(Payload::Single(item)) => {
                if *paginated {
                    Vec::new()
                } else {
                    vec![item.clone()]
                }
            }
            _ => Vec::new(),
        }
    }

    /// Human-readable `"Page X of Y"`; empty until a sequence is resolved
    pub fn page_label(&self) -> String {
        match self.sequence_len() {
            Some(len) => format!(
                "Page {} of {}",
                self.offset / self.page_size + 1,
                len.div_ceil(self.page_size)
            ),
            None => String::new(),
        }
    }
}

fn payload_to_value<T: Serialize>(payload: &Payload<T>) -> Result<Value> {
    let value = match payload {
        Payload::Single(item) => serde_json::to_value(item)?,
        Payload::Many(items) => serde_json::to_value(items)?,
    };
    Ok(value)
}

fn payload_from_value<T: DeserializeOwned>(value: Value) -> Result<Payload<T>> {
    match value {
        Value::Array(items) => {
            let rows = items
                .into_iter()
                .map(serde_json::from_value::<T>)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Payload::Many(rows))
        }
        other => Ok(Payload::Single(serde_json::from_value::<T>(other)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq_fetcher(rows: Vec<u32>) -> DataFetcher<u32> {
        DataFetcher::new("test:numbers", Box::new(move || Ok(Payload::Many(rows.clone()))))
    }

    #[test]
    fn single_payload_roundtrips_through_cache_value() {
        let value = payload_to_value(&Payload::Single(7u32)).unwrap();
        match payload_from_value::<u32>(value).unwrap() {
            Payload::Single(v) => assert_eq!(v, 7),
            Payload::Many(_) => panic!("expected single payload"),
        }
    }

    #[test]
    fn navigation_is_noop_before_data_resolves() {
        let mut fetcher = seq_fetcher(vec![1, 2, 3]).with_pagination(2);
        fetcher.next();
        fetcher.goto(1);
        assert_eq!(fetcher.offset(), 0);
        assert_eq!(fetcher.page_label(), "");
    }

    #[test]
    fn unpaginated_fetcher_ignores_navigation() {
        let mut client = QueryClient::new();
        let mut fetcher = seq_fetcher(vec![1, 2, 3, 4]);
        fetcher.execute(&mut client);
        fetcher.next();
        assert_eq!(fetcher.offset(), 0);
        assert_eq!(fetcher.current_page(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn paginated_single_payload_yields_empty_page() {
        let mut client = QueryClient::new();
        let mut fetcher: DataFetcher<u32> =
            DataFetcher::new("test:one", Box::new(|| Ok(Payload::Single(42))))
                .with_pagination(5);
        fetcher.execute(&mut client);
        assert!(fetcher.current_page().is_empty());
        assert_eq!(fetcher.page_label(), "");
    }
}

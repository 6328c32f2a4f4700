use std::cell::Cell;
use std::rc::Rc;

use anyhow::anyhow;
use cloudreport::fetcher::{DataFetcher, Payload, QueryClient, QueryState};
use cloudreport::models::{CloudResource, SortColumn};

fn counting_fetcher(
    key: &str,
    rows: Vec<u32>,
    calls: Rc<Cell<usize>>,
) -> DataFetcher<u32> {
    DataFetcher::new(
        key,
        Box::new(move || {
            calls.set(calls.get() + 1);
            Ok(Payload::Many(rows.clone()))
        }),
    )
}

#[test]
fn repeated_execute_hits_cache() {
    let calls = Rc::new(Cell::new(0));
    let mut client = QueryClient::new();
    let mut fetcher = counting_fetcher("key", vec![1, 2, 3], calls.clone());

    fetcher.execute(&mut client);
    fetcher.execute(&mut client);
    assert_eq!(calls.get(), 1);

    // A second fetcher for the same key resolves from cache too
    let other_calls = Rc::new(Cell::new(0));
    let mut other = counting_fetcher("key", vec![9, 9, 9], other_calls.clone());
    other.execute(&mut client);
    assert_eq!(other_calls.get(), 0);
    assert_eq!(other.current_page(), vec![1, 2, 3]);
}

#[test]
fn refetch_invalidates_and_reruns() {
    let calls = Rc::new(Cell::new(0));
    let mut client = QueryClient::new();
    let mut fetcher = counting_fetcher("key", vec![1, 2, 3], calls.clone());

    fetcher.execute(&mut client);
    fetcher.refetch(&mut client);
    assert_eq!(calls.get(), 2);
}

#[test]
fn disabled_fetcher_only_runs_on_refetch() {
    let calls = Rc::new(Cell::new(0));
    let mut client = QueryClient::new();
    let mut fetcher =
        counting_fetcher("key", vec![1, 2, 3], calls.clone()).with_enabled(false);

    fetcher.execute(&mut client);
    assert_eq!(calls.get(), 0);
    assert!(matches!(fetcher.state(), QueryState::Idle));
    assert!(fetcher.current_page().is_empty());

    fetcher.refetch(&mut client);
    assert_eq!(calls.get(), 1);
    assert_eq!(fetcher.current_page(), vec![1, 2, 3]);
}

#[test]
fn failed_fetch_surfaces_error_state() {
    let calls = Rc::new(Cell::new(0));
    let calls_inner = calls.clone();
    let mut client = QueryClient::new();
    let mut fetcher: DataFetcher<u32> = DataFetcher::new(
        "key",
        Box::new(move || {
            calls_inner.set(calls_inner.get() + 1);
            Err(anyhow!("connection refused"))
        }),
    )
    .with_pagination(5);

    fetcher.execute(&mut client);

    assert!(!fetcher.is_loading());
    assert!(fetcher.error().unwrap().contains("connection refused"));
    assert!(fetcher.current_page().is_empty());
    assert_eq!(fetcher.page_label(), "");
    assert!(!client.contains("key"));

    // No automatic retry: execute on a failed query is a no-op
    fetcher.execute(&mut client);
    assert_eq!(calls.get(), 1);

    // Explicit refetch is the only way out of the error state
    fetcher.refetch(&mut client);
    assert_eq!(calls.get(), 2);
    assert!(fetcher.error().is_some());
}

#[test]
fn single_payload_passes_through_unpaginated() {
    let mut client = QueryClient::new();
    let mut fetcher: DataFetcher<String> = DataFetcher::new(
        "key",
        Box::new(|| Ok(Payload::Single("only".to_string()))),
    );
    fetcher.execute(&mut client);

    assert_eq!(fetcher.current_page(), vec!["only".to_string()]);
    assert_eq!(fetcher.sequence_len(), None);
    assert_eq!(fetcher.page_label(), "");
}

#[test]
fn mismatched_cache_shape_falls_back_to_fetch() {
    let mut client = QueryClient::new();

    let mut strings: DataFetcher<String> = DataFetcher::new(
        "shared",
        Box::new(|| Ok(Payload::Single("text".to_string()))),
    );
    strings.execute(&mut client);
    assert!(client.contains("shared"));

    // Same key, different row type: the stale cached value is discarded
    let calls = Rc::new(Cell::new(0));
    let calls_inner = calls.clone();
    let mut numbers: DataFetcher<u32> = DataFetcher::new(
        "shared",
        Box::new(move || {
            calls_inner.set(calls_inner.get() + 1);
            Ok(Payload::Many(vec![1, 2]))
        }),
    );
    numbers.execute(&mut client);
    assert_eq!(calls.get(), 1);
    assert_eq!(numbers.current_page(), vec![1, 2]);
}

#[test]
fn filter_switch_resets_page_and_sort_before_new_fetch() {
    fn record(id: &str, cost: f64) -> CloudResource {
        CloudResource {
            instance_id: id.to_string(),
            cost,
            ..Default::default()
        }
    }

    let mut client = QueryClient::new();

    // Unfiltered view, sorted by cost, moved off the first page
    let all_rows = vec![record("a", 5.0), record("b", 1.0), record("c", 3.0)];
    let mut view: DataFetcher<CloudResource> = DataFetcher::new(
        "instances:all",
        Box::new(move || Ok(Payload::Many(all_rows.clone()))),
    )
    .with_pagination(2)
    .with_sort(Box::new(|a, b| SortColumn::Cost.compare(a, b)));
    view.execute(&mut client);
    view.next();
    assert_eq!(view.offset(), 2);

    // Filter switches to application "Foo": page and sort reset to defaults
    // before the superseding fetch resolves
    view.reset_view();
    assert_eq!(view.offset(), 0);

    let foo_rows = vec![record("z", 9.0), record("y", 2.0)];
    let mut filtered: DataFetcher<CloudResource> = DataFetcher::new(
        "instances:app:Foo",
        Box::new(move || Ok(Payload::Many(foo_rows.clone()))),
    )
    .with_pagination(2);
    assert_eq!(filtered.offset(), 0);
    filtered.execute(&mut client);

    // Unsorted: the new result keeps API order
    let ids: Vec<String> = filtered
        .current_page()
        .iter()
        .map(|r| r.instance_id.clone())
        .collect();
    assert_eq!(ids, vec!["z".to_string(), "y".to_string()]);
}

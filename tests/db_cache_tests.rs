use std::cell::Cell;
use std::env;
use std::rc::Rc;

use cloudreport::fetcher::{DataFetcher, Payload, QueryClient};
use tempfile::TempDir;

fn counting_fetcher(key: &str, calls: Rc<Cell<usize>>) -> DataFetcher<u32> {
    DataFetcher::new(
        key,
        Box::new(move || {
            calls.set(calls.get() + 1);
            Ok(Payload::Many(vec![10, 20, 30]))
        }),
    )
}

#[test]
#[serial_test::serial]
fn persistent_cache_survives_a_new_client() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("cache.db");
    // SAFETY: Test runs serially, no concurrent env access
    unsafe { env::set_var("CLOUDREPORT_DB_PATH", db_path.to_str().unwrap()) };

    let calls = Rc::new(Cell::new(0));

    let mut client = QueryClient::with_persistence();
    let mut fetcher = counting_fetcher("persist:key", calls.clone());
    fetcher.execute(&mut client);
    assert_eq!(calls.get(), 1);

    // Fresh client, fresh fetcher: the SQLite layer serves the result
    let mut second_client = QueryClient::with_persistence();
    let mut second = counting_fetcher("persist:key", calls.clone());
    second.execute(&mut second_client);
    assert_eq!(calls.get(), 1);
    assert_eq!(second.current_page(), vec![10, 20, 30]);

    // Refetch punches through both layers
    second.refetch(&mut second_client);
    assert_eq!(calls.get(), 2);

    unsafe { env::remove_var("CLOUDREPORT_DB_PATH") };
}

#[test]
#[serial_test::serial]
fn zero_ttl_disables_reuse_across_clients() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("cache.db");
    // SAFETY: Test runs serially, no concurrent env access
    unsafe {
        env::set_var("CLOUDREPORT_DB_PATH", db_path.to_str().unwrap());
        env::set_var("CLOUDREPORT_CACHE_TTL", "0");
    }

    let calls = Rc::new(Cell::new(0));

    let mut client = QueryClient::with_persistence();
    let mut fetcher = counting_fetcher("ttl:key", calls.clone());
    fetcher.execute(&mut client);
    assert_eq!(calls.get(), 1);

    // Same client still serves from memory within the run
    fetcher.execute(&mut client);
    assert_eq!(calls.get(), 1);

    // A new client finds only the expired row and fetches again
    let mut second_client = QueryClient::with_persistence();
    let mut second = counting_fetcher("ttl:key", calls.clone());
    second.execute(&mut second_client);
    assert_eq!(calls.get(), 2);

    unsafe {
        env::remove_var("CLOUDREPORT_DB_PATH");
        env::remove_var("CLOUDREPORT_CACHE_TTL");
    }
}

#[test]
#[serial_test::serial]
fn invalidate_clears_both_layers() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("cache.db");
    // SAFETY: Test runs serially, no concurrent env access
    unsafe { env::set_var("CLOUDREPORT_DB_PATH", db_path.to_str().unwrap()) };

    let calls = Rc::new(Cell::new(0));

    let mut client = QueryClient::with_persistence();
    let mut fetcher = counting_fetcher("inv:key", calls.clone());
    fetcher.execute(&mut client);
    client.invalidate("inv:key");

    let mut second_client = QueryClient::with_persistence();
    let mut second = counting_fetcher("inv:key", calls.clone());
    second.execute(&mut second_client);
    assert_eq!(calls.get(), 2);

    unsafe { env::remove_var("CLOUDREPORT_DB_PATH") };
}

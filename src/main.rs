use std::io::{self, BufRead, Write};

use anyhow::Result;
#[cfg(feature = "colors")]
use owo_colors::OwoColorize;

use cloudreport::api;
use cloudreport::cli::{Args, OrderArg, SortColumnArg};
use cloudreport::display;
#[cfg(not(feature = "colors"))]
use cloudreport::display::color_shim::ColorizeShim as OwoColorize;
use cloudreport::fetcher::{DataFetcher, PAGE_SIZES, Payload, QueryClient, SortFn};
use cloudreport::filters::{self, FilterSelection};
use cloudreport::models::{CloudResource, SortColumn};

fn main() -> Result<()> {
    let args = Args::parse();

    let mut client = if args.no_cache {
        QueryClient::new()
    } else {
        QueryClient::with_persistence()
    };

    if args.list_filters {
        list_filters(&args, &mut client)
    } else {
        run_report(&args, &mut client)
    }
}

fn selection_from_args(args: &Args) -> FilterSelection {
    if let Some(name) = &args.application {
        FilterSelection::Application(name.clone())
    } else if let Some(name) = &args.resource {
        FilterSelection::Resource(name.clone())
    } else {
        FilterSelection::None
    }
}

fn map_sort_column(arg: SortColumnArg) -> SortColumn {
    match arg {
        SortColumnArg::ServiceName => SortColumn::ServiceName,
        SortColumnArg::Location => SortColumn::Location,
        SortColumnArg::ResourceGroup => SortColumn::ResourceGroup,
        SortColumnArg::Date => SortColumn::Date,
        SortColumnArg::Cost => SortColumn::Cost,
        SortColumnArg::UnitOfMeasure => SortColumn::UnitOfMeasure,
    }
}

fn sort_fn(column: SortColumn, descending: bool) -> SortFn<CloudResource> {
    Box::new(move |a, b| {
        let ord = column.compare(a, b);
        if descending { ord.reverse() } else { ord }
    })
}

/// Fetch application and resource names and print the merged picker list
fn list_filters(args: &Args, client: &mut QueryClient) -> Result<()> {
    let mut applications: DataFetcher<String> = DataFetcher::new(
        "applications",
        Box::new(|| Ok(Payload::Many(api::fetch_applications()?))),
    );
    let mut resources: DataFetcher<String> = DataFetcher::new(
        "resources",
        Box::new(|| Ok(Payload::Many(api::fetch_resources()?))),
    );

    if args.refresh {
        applications.refetch(client);
        resources.refetch(client);
    } else {
        applications.execute(client);
        resources.execute(client);
    }

    for fetcher in [&applications, &resources] {
        if let Some(msg) = fetcher.error() {
            display::print_query_error(msg);
        }
    }

    let items = filters::merge_filter_items(
        &applications.current_page(),
        &resources.current_page(),
    );
    let items = filters::search_items(&items, &args.search);

    if args.json {
        display::print_filter_items_json(&items)?;
    } else {
        display::print_filter_items(&items);
    }
    Ok(())
}

fn run_report(args: &Args, client: &mut QueryClient) -> Result<()> {
    let filter = selection_from_args(args);

    let query_filter = filter.clone();
    let mut instances: DataFetcher<CloudResource> = DataFetcher::new(
        filter.cache_key(),
        Box::new(move || Ok(Payload::Many(query_filter.fetch_instances()?))),
    )
    .with_pagination(args.page_size.records());

    let mut sort_state = args.sort.map(|col| (map_sort_column(col), args.order == OrderArg::Desc));
    if let Some((column, descending)) = sort_state {
        instances.set_sort(Some(sort_fn(column, descending)));
    }

    if args.refresh {
        instances.refetch(client);
    } else {
        instances.execute(client);
    }

    if let Some(msg) = instances.error() {
        display::print_query_error(msg);
    }

    instances.goto(args.page);

    if args.debug {
        eprintln!("{}", "=== Debug Information ===".dimmed());
        eprintln!("Filter: {}", filter.describe());
        eprintln!("Cache key: {}", instances.key());
        eprintln!("Base URL: {}", api::base_url());
        eprintln!(
            "Records: {:?}, offset: {}, page size: {}",
            instances.sequence_len(),
            instances.offset(),
            instances.page_size()
        );
        eprintln!("{}", "=========================".dimmed());
    }

    render(args, &filter, &mut instances)?;

    if args.interactive && !args.json {
        interactive_loop(args, &filter, &mut instances, client, &mut sort_state)?;
    }
    Ok(())
}

fn render(
    args: &Args,
    filter: &FilterSelection,
    instances: &mut DataFetcher<CloudResource>,
) -> Result<()> {
    let rows = instances.current_page();
    let label = instances.page_label();
    if args.json {
        display::print_report_json(&rows, filter, &label, instances.sequence_len())?;
    } else {
        display::print_report_table(&rows, instances.is_loading(), &label);
    }
    Ok(())
}

fn parse_sort_column(name: &str) -> Option<SortColumn> {
    match name.trim().to_ascii_lowercase().as_str() {
        "service-name" | "service" => Some(SortColumn::ServiceName),
        "location" => Some(SortColumn::Location),
        "resource-group" | "group" => Some(SortColumn::ResourceGroup),
        "date" => Some(SortColumn::Date),
        "cost" => Some(SortColumn::Cost),
        "unit-of-measure" | "unit" => Some(SortColumn::UnitOfMeasure),
        _ => None,
    }
}

/// Stdin-driven pager over the resolved result set
fn interactive_loop(
    args: &Args,
    filter: &FilterSelection,
    instances: &mut DataFetcher<CloudResource>,
    client: &mut QueryClient,
    sort_state: &mut Option<(SortColumn, bool)>,
) -> Result<()> {
    let stdin = io::stdin();
    loop {
        print!("{} ", "❯".cyan());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let mut parts = line.split_whitespace();
        let command = match parts.next() {
            Some(cmd) => cmd,
            None => continue,
        };
        let operand = parts.next();

        match command {
            "n" => instances.next(),
            "p" => instances.prev(),
            "g" => {
                if let Some(index) = operand.and_then(|s| s.parse::<i64>().ok()) {
                    instances.goto(index);
                }
            }
            "z" => {
                match operand.and_then(|s| s.parse::<usize>().ok()) {
                    Some(size) if PAGE_SIZES.contains(&size) => instances.set_page_size(size),
                    _ => {
                        eprintln!("page size must be one of {PAGE_SIZES:?}");
                        continue;
                    }
                }
            }
            "s" => {
                if let Some(column) = operand.and_then(parse_sort_column) {
                    let descending = sort_state.as_ref().map(|(_, d)| *d).unwrap_or(false);
                    *sort_state = Some((column, descending));
                    instances.set_sort(Some(sort_fn(column, descending)));
                } else {
                    eprintln!(
                        "sort columns: service-name location resource-group date cost unit-of-measure"
                    );
                    continue;
                }
            }
            "o" => {
                if let Some((column, descending)) = sort_state {
                    *descending = !*descending;
                    instances.set_sort(Some(sort_fn(*column, *descending)));
                }
            }
            "c" => {
                *sort_state = None;
                instances.reset_view();
            }
            "r" => instances.refetch(client),
            "q" => break,
            _ => {
                eprintln!("commands: n p g K z SIZE s COL o c r q");
                continue;
            }
        }

        if let Some(msg) = instances.error() {
            display::print_query_error(msg);
        }
        render(args, filter, instances)?;
    }
    Ok(())
}

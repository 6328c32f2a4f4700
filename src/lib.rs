//! # cloudreport
//!
//! A terminal viewer for cloud-cost billing records. Fetches records from a
//! remote report API, caches query results (in memory and in SQLite), and
//! renders filterable, sortable, paginated tables.
//!
//! ## Overview
//!
//! The core abstraction is [`fetcher::DataFetcher`]: a cached fetch keyed by
//! a query string, with client-side pagination and sorting layered on top.
//! Everything else is thin: typed endpoint wrappers, a filter picker model,
//! and table/JSON rendering.
//!
//! ## Features
//!
//! - `colors` (default): Enables terminal color output via owo-colors

/// Typed GET endpoints for the report API
pub mod api;

/// Command-line argument parsing and configuration
pub mod cli;

/// SQLite-backed persistent cache for query results
pub mod db;

/// Table and JSON rendering
pub mod display;

/// Query cache client and the pagination/sort fetch abstraction
pub mod fetcher;

/// Filter selection and the grouped filter picker list
pub mod filters;

/// Wire-format data models
pub mod models;

//! # API Module
//!
//! Typed GET endpoints for the cloud-cost report service. All requests are
//! unauthenticated and return JSON; any non-2xx status or transport failure
//! surfaces as an `anyhow::Error` for the fetch layer to record.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::models::CloudResource;

const DEFAULT_BASE_URL: &str = "https://engineering-task.elancoapps.com";

/// Unreserved characters per RFC 3986; everything else in a path segment
/// gets percent-encoded.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

static AGENT: Lazy<ureq::Agent> = Lazy::new(|| {
    ureq::AgentBuilder::new()
        .timeout_read(Duration::from_secs(10))
        .timeout_write(Duration::from_secs(10))
        .build()
});

/// Base URL for the report API, overridable for tests and mirrors
pub fn base_url() -> String {
    match env::var("CLOUDREPORT_BASE_URL") {
        Ok(val) if !val.trim().is_empty() => val.trim().trim_end_matches('/').to_string(),
        _ => DEFAULT_BASE_URL.to_string(),
    }
}

fn encode_segment(name: &str) -> String {
    utf8_percent_encode(name, PATH_SEGMENT).to_string()
}

fn get_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    let url = format!("{}{}", base_url(), path);
    let response = AGENT
        .get(&url)
        .set("Accept", "application/json")
        .call()
        .with_context(|| format!("GET {url}"))?;

    response
        .into_json::<T>()
        .with_context(|| format!("decode response from {url}"))
}

/// All billing records
pub fn fetch_all_instances() -> Result<Vec<CloudResource>> {
    get_json("/api/raw")
}

/// Names of every application present in the data set
pub fn fetch_applications() -> Result<Vec<String>> {
    get_json("/api/applications")
}

/// Billing records tagged with one application name
pub fn fetch_instances_by_application(name: &str) -> Result<Vec<CloudResource>> {
    get_json(&format!("/api/applications/{}", encode_segment(name)))
}

/// Names of every resource present in the data set
pub fn fetch_resources() -> Result<Vec<String>> {
    get_json("/api/resources")
}

/// Billing records for one resource name
pub fn fetch_instances_by_resource(name: &str) -> Result<Vec<CloudResource>> {
    get_json(&format!("/api/resources/{}", encode_segment(name)))
}

//! # Filters Module
//!
//! Filter selection for the report (none, one application, or one resource)
//! and the merged, grouped item list backing the filter picker.

use anyhow::Result;
use serde::Serialize;

use crate::api;
use crate::models::CloudResource;

/// Which slice of the data set the report is scoped to.
///
/// Drives both the endpoint that gets called and the cache key the result is
/// stored under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FilterSelection {
    #[default]
    None,
    Application(String),
    Resource(String),
}

impl FilterSelection {
    /// Cache key for the instances query under this filter
    pub fn cache_key(&self) -> String {
        match self {
            FilterSelection::None => "instances:all".to_string(),
            FilterSelection::Application(name) => format!("instances:app:{name}"),
            FilterSelection::Resource(name) => format!("instances:res:{name}"),
        }
    }

    /// Issue the GET this filter maps to
    pub fn fetch_instances(&self) -> Result<Vec<CloudResource>> {
        match self {
            FilterSelection::None => api::fetch_all_instances(),
            FilterSelection::Application(name) => api::fetch_instances_by_application(name),
            FilterSelection::Resource(name) => api::fetch_instances_by_resource(name),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            FilterSelection::None => "all instances".to_string(),
            FilterSelection::Application(name) => format!("application \"{name}\""),
            FilterSelection::Resource(name) => format!("resource \"{name}\""),
        }
    }
}

/// One row of the filter picker. Section headers are non-selectable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterItem {
    pub id: String,
    pub name: String,
    pub disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FilterKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Application,
    Resource,
}

impl FilterItem {
    fn header(id: &str, name: &str) -> Self {
        FilterItem {
            id: id.to_string(),
            name: name.to_string(),
            disabled: true,
            kind: None,
        }
    }

    fn entry(name: &str, kind: FilterKind) -> Self {
        FilterItem {
            id: name.to_string(),
            name: name.to_string(),
            disabled: false,
            kind: Some(kind),
        }
    }

    /// The selection this item stands for; headers select nothing
    pub fn selection(&self) -> Option<FilterSelection> {
        match self.kind? {
            FilterKind::Application => Some(FilterSelection::Application(self.name.clone())),
            FilterKind::Resource => Some(FilterSelection::Resource(self.name.clone())),
        }
    }
}

/// Merge application and resource names into one grouped picker list, each
/// group behind a disabled header. Empty groups are omitted entirely.
pub fn merge_filter_items(applications: &[String], resources: &[String]) -> Vec<FilterItem> {
    let mut items = Vec::with_capacity(applications.len() + resources.len() + 2);

    if !applications.is_empty() {
        items.push(FilterItem::header("applications", "Applications"));
        items.extend(
            applications
                .iter()
                .map(|name| FilterItem::entry(name, FilterKind::Application)),
        );
    }
    if !resources.is_empty() {
        items.push(FilterItem::header("resources", "Resources"));
        items.extend(
            resources
                .iter()
                .map(|name| FilterItem::entry(name, FilterKind::Resource)),
        );
    }

    items
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Case-insensitive, whitespace-stripped containment match
pub fn matches_query(name: &str, query: &str) -> bool {
    normalize(name).contains(&normalize(query))
}

/// Narrow the picker list by a search query; an empty query keeps everything
pub fn search_items(items: &[FilterItem], query: &str) -> Vec<FilterItem> {
    if query.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| matches_query(&item.name, query))
        .cloned()
        .collect()
}

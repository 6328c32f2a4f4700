use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Tag bag attached to every billing record.
///
/// The API emits kebab-case keys, so each field carries an explicit rename.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceTags {
    #[serde(rename = "app-name", default)]
    pub app_name: String,
    #[serde(default)]
    pub environment: String,
    #[serde(rename = "business-unit", default)]
    pub business_unit: String,
}

/// One cloud billing record as returned by the report API.
///
/// Field names mirror the wire format (PascalCase, with the API's own
/// `Resourcelocation` casing quirk). Records are immutable once fetched;
/// they live only as long as the current query result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloudResource {
    #[serde(rename = "InstanceId", default)]
    pub instance_id: String,
    #[serde(rename = "ServiceName", default)]
    pub service_name: String,
    #[serde(rename = "Location", default)]
    pub location: String,
    #[serde(rename = "Resourcelocation", default)]
    pub resource_location: String,
    #[serde(rename = "ResourceGroup", default)]
    pub resource_group: String,
    #[serde(rename = "MeterCategory", default)]
    pub meter_category: String,
    #[serde(rename = "Date", default)]
    pub date: String,
    #[serde(rename = "Cost", default)]
    pub cost: f64,
    #[serde(rename = "UnitOfMeasure", default)]
    pub unit_of_measure: String,
    // The API serializes quantity as a string
    #[serde(rename = "ConsumedQuantity", default)]
    pub consumed_quantity: String,
    #[serde(rename = "Tags", default)]
    pub tags: ResourceTags,
}

impl CloudResource {
    /// Cost rounded to cents for display
    pub fn cost_rounded(&self) -> f64 {
        (self.cost * 100.0).round() / 100.0
    }

    /// Parse the record date (`MM/DD/YYYY`, the API's format) for sorting.
    /// Unparseable dates sort first.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%m/%d/%Y")
            .or_else(|_| NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d"))
            .ok()
    }
}

/// Sortable report columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    ServiceName,
    Location,
    ResourceGroup,
    Date,
    Cost,
    UnitOfMeasure,
}

impl SortColumn {
    /// Ascending comparison for this column. Strings compare lexically,
    /// cost with `total_cmp`, dates by parsed value with unparseable dates
    /// first.
    pub fn compare(self, a: &CloudResource, b: &CloudResource) -> std::cmp::Ordering {
        match self {
            SortColumn::ServiceName => a.service_name.cmp(&b.service_name),
            SortColumn::Location => a.location.cmp(&b.location),
            SortColumn::ResourceGroup => a.resource_group.cmp(&b.resource_group),
            SortColumn::Date => a.parsed_date().cmp(&b.parsed_date()),
            SortColumn::Cost => a.cost.total_cmp(&b.cost),
            SortColumn::UnitOfMeasure => a.unit_of_measure.cmp(&b.unit_of_measure),
        }
    }
}

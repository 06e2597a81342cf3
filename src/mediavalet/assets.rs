use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_json::{Map, Value};

use super::attributes::AttributeCatalog;
use super::error::ApiError;
use super::ApiClient;

/// Attribute display name → value for one asset. Values are passed through
/// untyped; the order is by name.
pub type AttributeValues = BTreeMap<String, Value>;

#[derive(Debug, Deserialize)]
struct AssetsResponse {
    #[serde(default)]
    payload: Option<AssetsPayload>,
}

#[derive(Debug, Default, Deserialize)]
struct AssetsPayload {
    #[serde(default)]
    assets: Option<Vec<AssetRecord>>,
}

#[derive(Debug, Deserialize)]
struct AssetRecord {
    #[serde(default)]
    file: Option<AssetFile>,
    #[serde(default)]
    attributes: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetFile {
    #[serde(default)]
    file_name: Option<String>,
}

/// Custom attribute values of every asset in a category, keyed by file name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetMetadataTable {
    by_file: HashMap<String, AttributeValues>,
}

impl AssetMetadataTable {
    pub fn get(&self, file_name: &str) -> Option<&AttributeValues> {
        self.by_file.get(file_name)
    }

    /// Record the values for a file. Returns the previous entry if the file
    /// name was already present (the new entry replaces it).
    pub fn insert(
        &mut self,
        file_name: impl Into<String>,
        values: AttributeValues,
    ) -> Option<AttributeValues> {
        self.by_file.insert(file_name.into(), values)
    }

    pub fn len(&self) -> usize {
        self.by_file.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_file.is_empty()
    }
}

/// OData container filter selecting a category and all its descendants.
///
/// Single quotes in the id are doubled, the OData string-literal escape.
pub fn category_filter(category_id: &str) -> String {
    let id = category_id.replace('\'', "''");
    format!("(CategoryIds/ANY(c: c EQ '{id}') OR CategoryAncestorIds/ANY(c: c EQ '{id}'))")
}

/// Keep only catalog attributes and rename them from id to display name.
fn named_attributes(
    attributes: Map<String, Value>,
    catalog: &AttributeCatalog,
) -> AttributeValues {
    attributes
        .into_iter()
        .filter_map(|(id, value)| catalog.name(&id).map(|name| (name.to_string(), value)))
        .collect()
}

/// Build the metadata table from the assets payload.
///
/// Assets without a file name (or with an empty one) are skipped. When two assets share a file
/// name the later one wins and a warning is logged.
fn project_assets(records: Vec<AssetRecord>, catalog: &AttributeCatalog) -> AssetMetadataTable {
    let mut table = AssetMetadataTable::default();
    for record in records {
        let Some(file_name) = record
            .file
            .and_then(|f| f.file_name)
            .filter(|name| !name.is_empty())
        else {
            tracing::debug!("Skipping asset with no file name");
            continue;
        };
        let values = named_attributes(record.attributes.unwrap_or_default(), catalog);
        if table.insert(file_name.clone(), values).is_some() {
            tracing::warn!(
                "Duplicate file name {} in category; keeping the last asset's metadata",
                file_name
            );
        }
    }
    table
}

/// Fetch the assets of a category (and its descendants) with their custom
/// attribute values.
///
/// GET `{api_base}/assets?containerFilter=...`. A non-200 status or an
/// unreadable body is logged and yields an empty table.
pub async fn fetch_assets_in_category(
    api: &ApiClient,
    catalog: &AttributeCatalog,
    category_id: &str,
) -> Result<AssetMetadataTable, ApiError> {
    let filter = category_filter(category_id);
    let response = api
        .get(&api.endpoints().assets(), &[("containerFilter", filter.as_str())])
        .await?;

    if !response.is_ok() {
        tracing::error!(
            "Failed to retrieve assets. Status Code: {}",
            response.status.as_u16()
        );
        tracing::error!("Response: {}", response.body);
        return Ok(AssetMetadataTable::default());
    }

    match serde_json::from_str::<AssetsResponse>(&response.body) {
        Ok(parsed) => {
            let records = parsed
                .payload
                .unwrap_or_default()
                .assets
                .unwrap_or_default();
            let asset_count = records.len();
            let table = project_assets(records, catalog);
            tracing::info!(
                "Retrieved {} assets ({} distinct file names) in category {}",
                asset_count,
                table.len(),
                category_id
            );
            Ok(table)
        }
        Err(e) => {
            tracing::error!("Assets response could not be parsed: {}", e);
            Ok(AssetMetadataTable::default())
        }
    }
}

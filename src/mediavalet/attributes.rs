use std::collections::BTreeMap;

use serde::Deserialize;

use super::error::ApiError;
use super::ApiClient;

/// One entry of the `/attributes` payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttributeDefinition {
    id: String,
    name: String,
    #[serde(default)]
    is_system_property: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct AttributesResponse {
    #[serde(default)]
    payload: Option<Vec<AttributeDefinition>>,
}

/// Custom (non-system) attributes of the library, keyed by attribute id.
///
/// Backed by a `BTreeMap` so iteration is ordered by id and everything
/// derived from the catalog is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeCatalog {
    by_id: BTreeMap<String, String>,
}

impl AttributeCatalog {
    /// Display name for an attribute id, if it is a custom attribute.
    pub fn name(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    /// All display names, in id order. Names may repeat if two ids share one.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_id.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl FromIterator<(String, String)> for AttributeCatalog {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            by_id: iter.into_iter().collect(),
        }
    }
}

fn custom_attributes(definitions: Vec<AttributeDefinition>) -> AttributeCatalog {
    definitions
        .into_iter()
        .filter(|def| !def.is_system_property.unwrap_or(false))
        .map(|def| (def.id, def.name))
        .collect()
}

/// Fetch the library's custom attribute definitions.
///
/// GET `{api_base}/attributes`. A non-200 status or an unreadable body is
/// logged and yields an empty catalog; the run carries on without custom
/// attributes.
pub async fn fetch_attribute_catalog(api: &ApiClient) -> Result<AttributeCatalog, ApiError> {
    let response = api.get(&api.endpoints().attributes(), &[]).await?;

    if !response.is_ok() {
        tracing::error!(
            "Failed to retrieve attributes. Status Code: {}",
            response.status.as_u16()
        );
        tracing::error!("Response: {}", response.body);
        return Ok(AttributeCatalog::default());
    }

    match serde_json::from_str::<AttributesResponse>(&response.body) {
        Ok(parsed) => {
            let catalog = custom_attributes(parsed.payload.unwrap_or_default());
            tracing::info!("Retrieved {} custom attributes", catalog.len());
            Ok(catalog)
        }
        Err(e) => {
            tracing::error!("Attributes response could not be parsed: {}", e);
            Ok(AttributeCatalog::default())
        }
    }
}

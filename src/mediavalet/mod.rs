//! MediaValet REST API access: the attribute catalog and category asset
//! queries. Every call carries the same header set (bearer token, API
//! version and APIM subscription key).

pub mod assets;
pub mod attributes;
pub mod error;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};

use crate::auth::endpoints::Endpoints;
use crate::auth::BearerToken;
use self::error::ApiError;

pub use self::assets::{fetch_assets_in_category, AssetMetadataTable, AttributeValues};
pub use self::attributes::{fetch_attribute_catalog, AttributeCatalog};

const API_VERSION: &str = "1.1";
const API_VERSION_HEADER: &str = "x-mv-api-version";
const SUBSCRIPTION_KEY_HEADER: &str = "ocp-apim-subscription-key";
const DEFAULT_USER_AGENT: &str = concat!("mv-xmp-writer/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by the token request and the API calls.
///
/// `timeout` of `None` leaves requests unbounded.
pub fn http_client(timeout: Option<Duration>) -> anyhow::Result<Client> {
    let mut builder = Client::builder().user_agent(DEFAULT_USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Status and body of a completed API call.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }
}

/// Authenticated API handle. Holds the bearer token for the lifetime of a
/// run; it is never refreshed.
pub struct ApiClient {
    http: Client,
    endpoints: Endpoints,
    token: BearerToken,
    subscription_key: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("endpoints", &self.endpoints)
            .field("token", &self.token)
            .field("subscription_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(
        http: Client,
        endpoints: Endpoints,
        token: BearerToken,
        subscription_key: String,
    ) -> Self {
        Self {
            http,
            endpoints,
            token,
            subscription_key,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token.as_str()))
                .map_err(|_| ApiError::InvalidHeader {
                    name: "Authorization",
                })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
        headers.insert(
            SUBSCRIPTION_KEY_HEADER,
            HeaderValue::from_str(&self.subscription_key).map_err(|_| {
                ApiError::InvalidHeader {
                    name: SUBSCRIPTION_KEY_HEADER,
                }
            })?,
        );
        Ok(headers)
    }

    /// GET `url` with the standard header set and optional query pairs.
    ///
    /// Any HTTP status is returned as a response; only transport failures
    /// are errors.
    pub async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<ApiResponse, ApiError> {
        tracing::debug!("GET {}", url);
        let mut request = self.http.get(url).headers(self.headers()?);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(status = status.as_u16(), bytes = body.len(), "Response from {}", url);
        Ok(ApiResponse { status, body })
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_sends_standard_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/attributes"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("x-mv-api-version", "1.1"))
            .and(header("ocp-apim-subscription-key", "test-subscription-key"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_client_for(&server);
        let resp = api.get(&api.endpoints().attributes(), &[]).await.unwrap();
        assert!(resp.is_ok());
        assert_eq!(resp.body, "{}");
    }

    #[tokio::test]
    async fn test_get_returns_non_200_as_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/assets"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let api = api_client_for(&server);
        let resp = api.get(&api.endpoints().assets(), &[]).await.unwrap();
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
        assert!(!resp.is_ok());
        assert_eq!(resp.body, "Unauthorized");
    }

    #[test]
    fn test_invalid_subscription_key_rejected() {
        let api = ApiClient::new(
            Client::new(),
            Endpoints::default(),
            BearerToken::new("t"),
            "bad\nkey".to_string(),
        );
        assert!(matches!(
            api.headers(),
            Err(ApiError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let api = ApiClient::new(
            Client::new(),
            Endpoints::default(),
            BearerToken::new("secret-token"),
            "secret-key".to_string(),
        );
        let debug = format!("{:?}", api);
        assert!(!debug.contains("secret-token"));
        assert!(!debug.contains("secret-key"));
    }
}

//! MediaValet authentication via the OAuth password grant.
//!
//! The application identifies itself with a client id/secret pair sent as
//! HTTP Basic credentials; the operator's username and password travel in
//! the form body. The resulting bearer token authorizes every API call.

pub mod endpoints;
pub mod error;
pub mod responses;

use reqwest::{Client, StatusCode};

use self::endpoints::Endpoints;
use self::error::AuthError;
use self::responses::TokenResponse;

const GRANT_TYPE: &str = "password";
const TOKEN_SCOPE: &str = "api";

/// Application credentials issued by MediaValet for API access.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// The operator's own login.
pub struct UserCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Bearer token returned by the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Exchange operator credentials for a bearer token.
///
/// POST `{auth_base}/connect/token` with Basic auth and a
/// `grant_type=password` form. Returns `Ok(None)` when the endpoint answers
/// with anything other than 200; the status and body are logged. Transport
/// failures and unreadable 200 bodies are errors.
pub async fn acquire_token(
    client: &Client,
    endpoints: &Endpoints,
    app: &ClientCredentials,
    user: &UserCredentials,
) -> Result<Option<BearerToken>, AuthError> {
    tracing::debug!("Requesting access token for {}", user.username);

    let form = [
        ("grant_type", GRANT_TYPE),
        ("username", user.username.as_str()),
        ("password", user.password.as_str()),
        ("scope", TOKEN_SCOPE),
    ];

    let response = client
        .post(endpoints.token())
        .basic_auth(&app.client_id, Some(&app.client_secret))
        .form(&form)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;
    if status != StatusCode::OK {
        tracing::error!("Token request failed: HTTP {} - {}", status.as_u16(), text);
        return Ok(None);
    }

    let body: TokenResponse = serde_json::from_str(&text)?;
    tracing::debug!(token_type = ?body.token_type, expires_in = ?body.expires_in, "Token issued");

    match body.access_token {
        Some(token) if !token.is_empty() => Ok(Some(BearerToken::new(token))),
        _ => {
            tracing::error!("Token response did not include an access_token");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // All credentials below are fake test values.
    fn app() -> ClientCredentials {
        ClientCredentials {
            client_id: "test-client".into(),
            client_secret: "test-secret".into(),
        }
    }

    fn user() -> UserCredentials {
        UserCredentials {
            username: "operator@example.com".into(),
            password: "hunter2".into(),
        }
    }

    fn endpoints_for(server: &MockServer) -> Endpoints {
        Endpoints::new(&server.uri(), &server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_acquire_token_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .and(header(
                "authorization",
                "Basic dGVzdC1jbGllbnQ6dGVzdC1zZWNyZXQ=",
            ))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=password"))
            .and(body_string_contains("username=operator%40example.com"))
            .and(body_string_contains("password=hunter2"))
            .and(body_string_contains("scope=api"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "abc123",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = acquire_token(&Client::new(), &endpoints_for(&server), &app(), &user())
            .await
            .unwrap();
        assert_eq!(token, Some(BearerToken::new("abc123")));
    }

    #[tokio::test]
    async fn test_acquire_token_rejected_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#),
            )
            .mount(&server)
            .await;

        let token = acquire_token(&Client::new(), &endpoints_for(&server), &app(), &user())
            .await
            .unwrap();
        assert!(token.is_none());
    }

    #[tokio::test]
    async fn test_acquire_token_missing_field_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        let token = acquire_token(&Client::new(), &endpoints_for(&server), &app(), &user())
            .await
            .unwrap();
        assert!(token.is_none());
    }

    #[tokio::test]
    async fn test_acquire_token_garbage_body_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let result =
            acquire_token(&Client::new(), &endpoints_for(&server), &app(), &user()).await;
        assert!(matches!(result, Err(AuthError::InvalidResponse(_))));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let app_debug = format!("{:?}", app());
        assert!(app_debug.contains("test-client"));
        assert!(!app_debug.contains("test-secret"));

        let user_debug = format!("{:?}", user());
        assert!(!user_debug.contains("hunter2"));

        let token_debug = format!("{:?}", BearerToken::new("abc123"));
        assert!(!token_debug.contains("abc123"));
    }
}

use serde::Deserialize;

/// Response from `/connect/token`.
#[derive(Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_full() {
        let json = r#"{
            "access_token": "eyJhbGciOi",
            "expires_in": 3600,
            "token_type": "Bearer",
            "scope": "api"
        }"#;
        let resp: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.access_token.as_deref(), Some("eyJhbGciOi"));
        assert_eq!(resp.token_type.as_deref(), Some("Bearer"));
        assert_eq!(resp.expires_in, Some(3600));
    }

    #[test]
    fn test_token_response_minimal() {
        let resp: TokenResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.access_token.is_none());
    }

    #[test]
    fn test_token_response_debug_redacts() {
        let resp: TokenResponse =
            serde_json::from_str(r#"{"access_token": "super-secret"}"#).unwrap();
        let debug = format!("{:?}", resp);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}

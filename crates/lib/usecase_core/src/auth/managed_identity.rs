//! Managed identity token source.
//!
//! App Service / Functions expose `IDENTITY_ENDPOINT` and `IDENTITY_HEADER`;
//! everywhere else the Azure Instance Metadata Service is used.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{AcquiredToken, AuthError, TokenSource};

pub const GRAPH_RESOURCE: &str = "https://graph.microsoft.com";

const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";

/// Where the identity endpoint lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEndpoint {
    /// App Service style endpoint with its secret header.
    AppService { endpoint: String, header: String },
    /// Instance Metadata Service.
    Imds { endpoint: String },
}

impl IdentityEndpoint {
    /// Picks App Service when both variables are set, IMDS otherwise.
    pub fn from_env() -> Self {
        match (
            std::env::var("IDENTITY_ENDPOINT").ok(),
            std::env::var("IDENTITY_HEADER").ok(),
        ) {
            (Some(endpoint), Some(header)) if !endpoint.is_empty() => {
                Self::AppService { endpoint, header }
            }
            _ => Self::Imds {
                endpoint: IMDS_ENDPOINT.into(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ManagedIdentityResponse {
    access_token: Option<String>,
    /// Epoch seconds; both endpoints send it as a string.
    expires_on: Option<Value>,
}

/// Acquires tokens for `resource` from the managed identity endpoint.
pub struct ManagedIdentityTokenSource {
    http: Client,
    endpoint: IdentityEndpoint,
    resource: String,
    client_id: Option<String>,
}

impl ManagedIdentityTokenSource {
    pub fn new(http: Client, endpoint: IdentityEndpoint, resource: impl Into<String>) -> Self {
        Self {
            http,
            endpoint,
            resource: resource.into(),
            client_id: None,
        }
    }

    /// Selects a user-assigned identity.
    pub fn with_client_id(mut self, client_id: Option<String>) -> Self {
        self.client_id = client_id;
        self
    }
}

#[async_trait]
impl TokenSource for ManagedIdentityTokenSource {
    async fn fetch_token(&self) -> Result<AcquiredToken, AuthError> {
        let mut query = vec![("resource", self.resource.as_str())];
        if let Some(client_id) = &self.client_id {
            query.push(("client_id", client_id.as_str()));
        }

        let request = match &self.endpoint {
            IdentityEndpoint::AppService { endpoint, header } => {
                query.push(("api-version", APP_SERVICE_API_VERSION));
                self.http
                    .get(endpoint)
                    .header("X-IDENTITY-HEADER", header)
                    .query(&query)
            }
            IdentityEndpoint::Imds { endpoint } => {
                query.push(("api-version", IMDS_API_VERSION));
                self.http.get(endpoint).header("Metadata", "true").query(&query)
            }
        };

        debug!(resource = %self.resource, "requesting managed identity token");
        let resp = request.send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            warn!(status, "managed identity endpoint returned an error");
            return Err(AuthError::TokenEndpoint { status, body });
        }

        let token: ManagedIdentityResponse = resp.json().await?;
        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        Ok(AcquiredToken {
            access_token,
            expires_at_ms: token.expires_on.as_ref().and_then(epoch_seconds).map(|s| s * 1000),
        })
    }
}

fn epoch_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn app_service_endpoint_sends_identity_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/msi/token"))
            .and(header("X-IDENTITY-HEADER", "secret"))
            .and(query_param("resource", GRAPH_RESOURCE))
            .and(query_param("api-version", "2019-08-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "graph-token",
                "expires_on": "1700000000",
                "resource": GRAPH_RESOURCE,
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        let source = ManagedIdentityTokenSource::new(
            Client::new(),
            IdentityEndpoint::AppService {
                endpoint: format!("{}/msi/token", server.uri()),
                header: "secret".into(),
            },
            GRAPH_RESOURCE,
        );
        let token = source.fetch_token().await.unwrap();
        assert_eq!(token.access_token, "graph-token");
        assert_eq!(token.expires_at_ms, Some(1_700_000_000_000));
    }

    #[tokio::test]
    async fn imds_endpoint_sends_metadata_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("Metadata", "true"))
            .and(query_param("api-version", "2018-02-01"))
            .and(query_param("client_id", "user-assigned"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "imds-token",
                "expires_on": 1700000123
            })))
            .mount(&server)
            .await;

        let source = ManagedIdentityTokenSource::new(
            Client::new(),
            IdentityEndpoint::Imds {
                endpoint: server.uri(),
            },
            GRAPH_RESOURCE,
        )
        .with_client_id(Some("user-assigned".into()));
        let token = source.fetch_token().await.unwrap();
        assert_eq!(token.access_token, "imds-token");
        assert_eq!(token.expires_at_ms, Some(1_700_000_123_000));
    }

    #[tokio::test]
    async fn identity_errors_surface_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("no identity"))
            .mount(&server)
            .await;

        let source = ManagedIdentityTokenSource::new(
            Client::new(),
            IdentityEndpoint::Imds {
                endpoint: server.uri(),
            },
            GRAPH_RESOURCE,
        );
        assert!(matches!(
            source.fetch_token().await,
            Err(AuthError::TokenEndpoint { status: 400, .. })
        ));
    }
}

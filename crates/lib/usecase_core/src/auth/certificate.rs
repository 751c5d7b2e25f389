//! App-only client-credential exchange with a certificate assertion.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::assertion::sign_client_assertion;
use super::{AcquiredToken, AuthError, Credential, TokenSource};
use crate::config::DEFAULT_AUTHORITY_HOST;

const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Response from the v2.0 token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    /// Seconds until expiry.
    expires_in: Option<i64>,
}

/// Exchanges a signed client assertion for a SharePoint app-only token.
pub struct CertificateTokenSource {
    http: Client,
    credential: Credential,
    authority_host: String,
}

impl CertificateTokenSource {
    pub fn new(http: Client, credential: Credential) -> Self {
        Self {
            http,
            credential,
            authority_host: DEFAULT_AUTHORITY_HOST.into(),
        }
    }

    /// Points the exchange at another authority (sovereign clouds, tests).
    pub fn with_authority_host(mut self, authority_host: impl Into<String>) -> Self {
        self.authority_host = authority_host.into().trim_end_matches('/').to_string();
        self
    }

    /// `{authority}/{tenant}/oauth2/v2.0/token`
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host, self.credential.tenant_id
        )
    }
}

#[async_trait]
impl TokenSource for CertificateTokenSource {
    async fn fetch_token(&self) -> Result<AcquiredToken, AuthError> {
        let endpoint = self.token_endpoint();
        let assertion = sign_client_assertion(&self.credential, &endpoint)?;
        let scope = self.credential.scope();

        let params = [
            ("client_id", self.credential.client_id.as_str()),
            ("scope", scope.as_str()),
            ("grant_type", "client_credentials"),
            ("client_assertion_type", CLIENT_ASSERTION_TYPE),
            ("client_assertion", assertion.as_str()),
        ];

        debug!(scope = %scope, "requesting app-only token");
        let started = Utc::now().timestamp_millis();
        let resp = self.http.post(&endpoint).form(&params).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            warn!(status, "token endpoint rejected client assertion");
            return Err(AuthError::TokenEndpoint { status, body });
        }

        let token: TokenResponse = resp.json().await?;
        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        Ok(AcquiredToken {
            access_token,
            expires_at_ms: token.expires_in.map(|secs| started + secs * 1000),
        })
    }
}

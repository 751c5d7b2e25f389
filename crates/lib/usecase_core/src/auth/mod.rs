//! App-only authentication against Entra ID.
//!
//! Provides the certificate credential, PEM normalisation, client-assertion
//! signing, the token sources (certificate client-credential flow and
//! managed identity) and the expiry-aware token cache shared by the
//! SharePoint and Graph clients.

pub mod assertion;
pub mod cache;
pub mod certificate;
pub mod managed_identity;
pub mod pem;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

pub use cache::TokenCache;
pub use certificate::CertificateTokenSource;
pub use managed_identity::ManagedIdentityTokenSource;
pub use pem::normalize_private_key;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Token endpoint returned HTTP {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error("Token request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Token response did not contain an access token")]
    MissingToken,
}

/// Certificate-based app registration used for app-only access.
#[derive(Clone)]
pub struct Credential {
    pub client_id: String,
    pub tenant_id: String,
    /// Hex SHA-1 thumbprint of the uploaded certificate.
    pub certificate_thumbprint: String,
    /// PKCS#8 private key as supplied, normalised on use.
    pub private_key_pem: String,
    /// e.g. `https://tenant.sharepoint.com`
    pub site_origin: String,
}

impl Credential {
    pub fn new(
        client_id: impl Into<String>,
        tenant_id: impl Into<String>,
        certificate_thumbprint: impl Into<String>,
        private_key_pem: impl Into<String>,
        site_origin: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            tenant_id: tenant_id.into(),
            certificate_thumbprint: certificate_thumbprint.into(),
            private_key_pem: private_key_pem.into(),
            site_origin: site_origin.into(),
        }
    }

    /// Scope requested for SharePoint app-only tokens.
    pub fn scope(&self) -> String {
        format!("{}/.default", self.site_origin.trim_end_matches('/'))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("client_id", &self.client_id)
            .field("tenant_id", &self.tenant_id)
            .field("certificate_thumbprint", &self.certificate_thumbprint)
            .field("private_key_pem", &"<redacted>")
            .field("site_origin", &self.site_origin)
            .finish()
    }
}

/// A token freshly returned by an identity endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredToken {
    pub access_token: String,
    /// Absolute expiry in epoch milliseconds, when the endpoint reported one.
    pub expires_at_ms: Option<i64>,
}

/// Performs one token exchange against an identity endpoint.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> Result<AcquiredToken, AuthError>;
}

/// Hands out bearer tokens to the REST clients.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthError>;
}

/// Fixed bearer token, for local tooling and tests.
#[derive(Clone, Debug)]
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, AuthError> {
        Ok(self.0.clone())
    }
}

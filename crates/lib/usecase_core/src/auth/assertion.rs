//! Client-assertion JWTs for the certificate client-credential flow.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use super::{AuthError, Credential};
use crate::auth::pem::normalize_private_key;

/// Lifetime of a signed assertion: 10 minutes.
const ASSERTION_LIFETIME_SECS: i64 = 10 * 60;

/// Registered claims Entra ID expects in a client assertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub aud: String,
    pub iss: String,
    pub sub: String,
    pub jti: String,
    pub nbf: i64,
    pub iat: i64,
    pub exp: i64,
}

/// Converts a hex SHA-1 thumbprint into the base64url `x5t` header value.
///
/// Colons and whitespace, as copied from certificate viewers, are ignored.
pub fn thumbprint_to_x5t(thumbprint: &str) -> Result<String, AuthError> {
    let cleaned: String = thumbprint
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    let bytes = hex::decode(&cleaned)
        .map_err(|e| AuthError::InvalidCredential(format!("certificate thumbprint: {e}")))?;
    if bytes.is_empty() {
        return Err(AuthError::InvalidCredential("certificate thumbprint is empty".into()));
    }
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Signs an RS256 client assertion for `audience` (the token endpoint).
pub fn sign_client_assertion(credential: &Credential, audience: &str) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = AssertionClaims {
        aud: audience.to_string(),
        iss: credential.client_id.clone(),
        sub: credential.client_id.clone(),
        jti: uuid::Uuid::new_v4().to_string(),
        nbf: now,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.x5t = Some(thumbprint_to_x5t(&credential.certificate_thumbprint)?);

    let pem = normalize_private_key(&credential.private_key_pem);
    let key = EncodingKey::from_rsa_pem(pem.as_bytes())
        .map_err(|e| AuthError::InvalidCredential(format!("private key: {e}")))?;

    encode(&header, &claims, &key)
        .map_err(|e| AuthError::InvalidCredential(format!("client assertion: {e}")))
}

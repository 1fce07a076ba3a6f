//! Verification of the identity provider's session tokens.
//!
//! The API never issues sessions itself; it only checks signatures on the
//! tokens the identity provider hands to browsers and reads the user and
//! organization ids out of them.

pub mod admin;
pub mod tenant;

use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

pub use admin::{build_admin_gate, AdminCredentials, AdminGate, AllowListGate, SessionCookieGate};
pub use tenant::resolve_tenant;

/// Claims carried by identity provider session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Active organization, absent when the user has none selected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: i64,
}

/// Authenticated caller, inserted into request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub org_id: Option<String>,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            org_id: claims.org_id.filter(|org| !org.is_empty()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no session token on request")]
    Missing,

    #[error("session verification key not configured")]
    NotConfigured,

    #[error("invalid session verification key: {0}")]
    InvalidKey(String),

    #[error("invalid session token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

/// Checks session token signatures with the key resolved at start-up
pub struct SessionVerifier {
    key: Option<DecodingKey>,
    validation: Validation,
    cookie_name: String,
}

impl SessionVerifier {
    /// RS256 when a PEM public key is configured, otherwise HS256 with the
    /// shared secret. With neither, every token is rejected.
    pub fn from_config(security: &SecurityConfig) -> Result<Self, SessionError> {
        let (key, algorithm) = match &security.session_jwt_public_key {
            Some(pem) => {
                let key = DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| SessionError::InvalidKey(e.to_string()))?;
                (Some(key), Algorithm::RS256)
            }
            None if !security.session_jwt_secret.is_empty() => (
                Some(DecodingKey::from_secret(security.session_jwt_secret.as_bytes())),
                Algorithm::HS256,
            ),
            None => (None, Algorithm::HS256),
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_aud = false;

        Ok(Self {
            key,
            validation,
            cookie_name: security.session_cookie_name.clone(),
        })
    }

    pub fn verify(&self, token: &str) -> Result<Session, SessionError> {
        let key = self.key.as_ref().ok_or(SessionError::NotConfigured)?;
        let data = decode::<Claims>(token, key, &self.validation)?;
        Ok(data.claims.into())
    }

    /// Verify the token carried by a request, if any
    pub fn verify_headers(&self, headers: &HeaderMap) -> Result<Session, SessionError> {
        let token = extract_token(headers, &self.cookie_name).ok_or(SessionError::Missing)?;
        self.verify(&token)
    }
}

/// `Authorization: Bearer` first, then the session cookie
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    match bearer {
        Some(token) => Some(token.to_string()),
        None => cookie_value(headers, cookie_name),
    }
}

pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    headers
        .get_all("cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|part| part.trim().strip_prefix(prefix.as_str()))
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn verifier(secret: &str) -> SessionVerifier {
        let mut security = AppConfig::development().security;
        security.session_jwt_secret = secret.to_string();
        security.session_jwt_public_key = None;
        SessionVerifier::from_config(&security).unwrap()
    }

    fn token(secret: &str, org: Option<&str>, exp_offset: Duration) -> String {
        let claims = Claims {
            sub: "user_1".to_string(),
            org_id: org.map(str::to_string),
            email: None,
            exp: (Utc::now() + exp_offset).timestamp(),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn bearer_takes_precedence_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer abc".parse().unwrap());
        headers.insert("cookie", "theme=dark; __session=xyz".parse().unwrap());
        assert_eq!(extract_token(&headers, "__session").as_deref(), Some("abc"));

        headers.remove("authorization");
        assert_eq!(extract_token(&headers, "__session").as_deref(), Some("xyz"));
    }

    #[test]
    fn verifies_signature_and_expiry() {
        let v = verifier("secret");

        let session = v.verify(&token("secret", Some("org_1"), Duration::hours(1))).unwrap();
        assert_eq!(session.user_id, "user_1");
        assert_eq!(session.org_id.as_deref(), Some("org_1"));

        assert!(v.verify(&token("other", Some("org_1"), Duration::hours(1))).is_err());
        assert!(v.verify(&token("secret", Some("org_1"), Duration::hours(-2))).is_err());
    }

    #[test]
    fn unconfigured_verifier_rejects_everything() {
        let v = verifier("");
        assert!(matches!(
            v.verify(&token("x", None, Duration::hours(1))),
            Err(SessionError::NotConfigured)
        ));
    }
}

//! Session context: who the chat client is acting for.
//!
//! Built once at startup from a [`CredentialStore`] and handed to the
//! controller. Nothing else reads credential storage.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use parley_types::error::CredentialError;
use parley_types::user::UserRecord;
use serde::{Deserialize, Serialize};

/// What the client keeps between runs after a login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl StoredCredentials {
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.user.is_none() && self.user_id.is_none()
    }
}

/// Client-side credential storage.
///
/// Implementations live in parley-infra (`FileCredentialStore`).
pub trait CredentialStore: Send + Sync {
    /// Read stored credentials. A store with nothing in it yields the default.
    fn load(&self) -> Result<StoredCredentials, CredentialError>;

    fn save(&self, credentials: &StoredCredentials) -> Result<(), CredentialError>;

    /// Remove all stored credentials.
    fn clear(&self) -> Result<(), CredentialError>;
}

/// The resolved identity of the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub token: Option<String>,
    pub user: Option<UserRecord>,
    pub user_id: String,
}

impl SessionContext {
    /// Resolve the current user.
    ///
    /// Order: stored user record, then stored user id, then the `id` claim of
    /// the stored token. Fails with [`CredentialError::NotLoggedIn`] when none
    /// of them yields an id.
    pub fn resolve(credentials: StoredCredentials) -> Result<Self, CredentialError> {
        let StoredCredentials {
            token,
            user,
            user_id,
        } = credentials;

        let from_user = user
            .as_ref()
            .map(|u| u.id.trim().to_string())
            .filter(|id| !id.is_empty());
        let from_id = user_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        let resolved = match from_user.or(from_id) {
            Some(id) => id,
            None => match token.as_deref() {
                Some(token) => decode_token_user_id(token)?,
                None => return Err(CredentialError::NotLoggedIn),
            },
        };

        Ok(Self {
            token,
            user,
            user_id: resolved,
        })
    }

    /// Load from a store and resolve.
    pub fn from_store(store: &impl CredentialStore) -> Result<Self, CredentialError> {
        Self::resolve(store.load()?)
    }

    /// Name to greet the user with.
    pub fn display_name(&self) -> &str {
        self.user
            .as_ref()
            .map(|u| u.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(self.user_id.as_str())
    }
}

#[derive(Deserialize)]
struct TokenClaims {
    id: Option<serde_json::Value>,
}

/// Read the `id` claim from a JWT's payload segment.
///
/// The signature is not checked; the token was issued to this client and the
/// History Service does its own scoping by user id.
pub fn decode_token_user_id(token: &str) -> Result<String, CredentialError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| CredentialError::Malformed("token has no payload segment".to_string()))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| CredentialError::Malformed(format!("token payload is not base64url: {e}")))?;

    let claims: TokenClaims = serde_json::from_slice(&bytes)
        .map_err(|e| CredentialError::Malformed(format!("token payload is not JSON: {e}")))?;

    match claims.id {
        Some(serde_json::Value::String(id)) if !id.trim().is_empty() => Ok(id),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        _ => Err(CredentialError::NotLoggedIn),
    }
}

//! Client for the external authentication service's token check.
//!
//! Parley never issues tokens. It only asks the auth service whether a stored
//! token is still valid (`GET /verify/verifyToken`).

use parley_types::error::BackendError;
use parley_types::user::VerifyTokenResponse;
use reqwest::{StatusCode, Url};

pub struct AuthClient {
    base: Url,
    client: reqwest::Client,
}

impl AuthClient {
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let base = Url::parse(base_url)
            .map_err(|e| BackendError::Unavailable(format!("invalid auth URL '{base_url}': {e}")))?;
        Ok(Self {
            base,
            client: reqwest::Client::new(),
        })
    }

    /// Check a bearer token.
    ///
    /// A 401 is an answer, not a failure: it comes back as
    /// `success: false` with no user.
    pub async fn verify_token(&self, token: &str) -> Result<VerifyTokenResponse, BackendError> {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["verify", "verifyToken"]);
        }

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(VerifyTokenResponse {
                success: false,
                user: None,
            }),
            status if status.is_success() => response
                .json::<VerifyTokenResponse>()
                .await
                .map_err(|e| BackendError::Decode(e.to_string())),
            status => Err(BackendError::Rejected {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

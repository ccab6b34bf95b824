//! The API client: bearer attachment, dispatch, and the one-shot
//! refresh-and-retry cycle.

use crate::models::{
    extract_error_message, ApiEnvelope, AuthPayload, PicturePayload, ProfilePayload,
    RefreshPayload, RegisterRequest,
};
use crate::{ApiError, ApiResult};
use orbit_core::{Config, UserRecord};
use orbit_storage::TokenVault;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Request, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client for the account API.
///
/// Cheap to clone; clones share the underlying connection pool and vault.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    vault: TokenVault,
}

impl ApiClient {
    /// Create a client for the given base URL with the default timeout.
    pub fn new(base_url: impl Into<String>, vault: TokenVault) -> ApiResult<Self> {
        Self::with_timeout(
            base_url,
            vault,
            Duration::from_secs(orbit_core::DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Create a client from the SDK configuration.
    pub fn from_config(config: &Config, vault: TokenVault) -> ApiResult<Self> {
        Self::with_timeout(
            config.api_base_url.clone(),
            vault,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn with_timeout(
        base_url: impl Into<String>,
        vault: TokenVault,
        timeout: Duration,
    ) -> ApiResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            vault,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ==========================================
    // Auth endpoints
    // ==========================================

    /// Register a new account. Returns the user plus a fresh credential
    /// pair; the caller decides whether to persist them.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthPayload> {
        let request = self
            .http
            .post(self.endpoint("/auth/register"))
            .json(request)
            .build()?;
        let response = check(self.send_with_auth(request).await?).await?;
        let envelope: ApiEnvelope<AuthPayload> = decode(response).await?;
        Ok(envelope.data)
    }

    /// Log in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthPayload> {
        let request = self
            .http
            .post(self.endpoint("/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .build()?;
        let response = check(self.send_with_auth(request).await?).await?;
        let envelope: ApiEnvelope<AuthPayload> = decode(response).await?;
        Ok(envelope.data)
    }

    /// Fetch the profile of the currently authenticated user.
    pub async fn current_profile(&self) -> ApiResult<UserRecord> {
        let request = self.http.get(self.endpoint("/auth/me")).build()?;
        let response = check(self.send_with_auth(request).await?).await?;
        let envelope: ApiEnvelope<ProfilePayload> = decode(response).await?;
        Ok(envelope.data.user)
    }

    /// Invalidate the given refresh token server-side.
    pub async fn logout(&self, refresh_token: &str) -> ApiResult<()> {
        let request = self
            .http
            .post(self.endpoint("/auth/logout"))
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .build()?;
        check(self.send_with_auth(request).await?).await?;
        Ok(())
    }

    /// Request a password reset email.
    pub async fn forgot_password(&self, email: &str) -> ApiResult<()> {
        let request = self
            .http
            .post(self.endpoint("/auth/forgot-password"))
            .json(&serde_json::json!({ "email": email }))
            .build()?;
        check(self.send_with_auth(request).await?).await?;
        Ok(())
    }

    /// Complete a password reset with the emailed token.
    pub async fn reset_password(&self, token: &str, password: &str) -> ApiResult<()> {
        let request = self
            .http
            .post(self.endpoint("/auth/reset-password"))
            .json(&serde_json::json!({ "token": token, "password": password }))
            .build()?;
        check(self.send_with_auth(request).await?).await?;
        Ok(())
    }

    // ==========================================
    // Profile picture endpoints
    // ==========================================

    /// Upload a profile picture, returning the hosted image URL.
    ///
    /// The multipart body is not replayable, so a 401 on this request
    /// propagates without a refresh-retry.
    pub async fn upload_profile_picture(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ApiResult<String> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("image/jpeg")?;
        let form = reqwest::multipart::Form::new().part("profilePicture", part);
        let request = self
            .http
            .post(self.endpoint("/users/profile-picture"))
            .multipart(form)
            .build()?;
        let response = check(self.send_with_auth(request).await?).await?;
        let envelope: ApiEnvelope<PicturePayload> = decode(response).await?;
        Ok(envelope.data.image_url)
    }

    /// Delete the current profile picture.
    pub async fn delete_profile_picture(&self) -> ApiResult<()> {
        let request = self
            .http
            .delete(self.endpoint("/users/profile-picture"))
            .build()?;
        check(self.send_with_auth(request).await?).await?;
        Ok(())
    }

    // ==========================================
    // Transport core
    // ==========================================

    /// Dispatch a request with the stored access token attached.
    ///
    /// On a 401, the stored refresh token is exchanged for a new access
    /// token and the original request is replayed exactly once. Any other
    /// outcome, including a 401 on the replay, passes through unchanged.
    async fn send_with_auth(&self, mut request: Request) -> ApiResult<reqwest::Response> {
        // Clone before the bearer header goes on, so the retry gets the
        // refreshed token and nothing stale.
        let retry = request.try_clone();

        if let Some(token) = self.current_access_token().await {
            attach_bearer(&mut request, &token);
        }

        debug!(method = %request.method(), url = %request.url(), "Dispatching API request");
        let response = self.http.execute(request).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let Some(mut retry_request) = retry else {
            debug!("401 on a non-replayable request, not retrying");
            return Ok(response);
        };

        let refresh_token = match self.vault.refresh_token().await {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "Failed to read refresh token");
                None
            }
        };
        let Some(refresh_token) = refresh_token else {
            // A lone access token is a partial pair; drop it along with
            // the rejected session.
            self.clear_vault_best_effort().await;
            return Ok(response);
        };

        match self.refresh_access_token(&refresh_token).await {
            Ok(new_token) => {
                self.vault.store_access_token(&new_token).await?;
                attach_bearer(&mut retry_request, &new_token);
                debug!(url = %retry_request.url(), "Retrying request with refreshed token");
                Ok(self.http.execute(retry_request).await?)
            }
            Err(err) => {
                warn!(error = %err, "Token refresh failed, clearing stored session");
                self.clear_vault_best_effort().await;
                // The caller sees the original 401, not the refresh failure.
                Ok(response)
            }
        }
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Sent bare: the rejected bearer token must not ride along.
    async fn refresh_access_token(&self, refresh_token: &str) -> ApiResult<String> {
        let response = self
            .http
            .post(self.endpoint("/auth/refresh-token"))
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await?;
        let response = check(response).await?;
        let envelope: ApiEnvelope<RefreshPayload> = decode(response).await?;
        Ok(envelope.data.access_token)
    }

    async fn current_access_token(&self) -> Option<String> {
        match self.vault.access_token().await {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "Failed to read access token, sending request without credentials");
                None
            }
        }
    }

    async fn clear_vault_best_effort(&self) {
        if let Err(err) = self.vault.clear().await {
            tracing::error!(error = %err, "Failed to clear stored credentials");
        }
    }
}

fn attach_bearer(request: &mut Request, token: &str) {
    match HeaderValue::from_str(&format!("Bearer {token}")) {
        Ok(value) => {
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        Err(_) => warn!("Stored access token is not a valid header value, skipping"),
    }
}

/// Map a non-success response to `ApiError::Http` carrying the server's
/// message.
async fn check(response: reqwest::Response) -> ApiResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(status, &body);
    warn!(status = %status, message = %message, "API request failed");
    Err(ApiError::Http {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

//! Reqwest-backed auth service adapter.
//!
//! Owns transport details only: endpoint layout, timeouts, status mapping
//! and JSON decoding. A `401` from session validation means "no session" and
//! is not an error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use super::dto::{MfaSecretDto, RevisionHistoryDto, SessionValidationDto, SettingDto};
use crate::domain::UserId;
use crate::domain::ports::{
    AuthService, AuthServiceError, AuthenticatedSession, AuthenticationMethodResolver,
    MfaTransition,
};

const MFA_TRANSITION_SETTING: &str = "mfa_transition";

/// Auth service client bound to one base URL.
#[derive(Clone)]
pub struct HttpAuthService {
    client: Client,
    base_url: Url,
}

impl HttpAuthService {
    /// Build a client with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, AuthServiceError> {
        endpoint(&self.base_url, segments)
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<RequestBuilder, AuthServiceError> {
        Ok(self
            .client
            .request(method, self.endpoint(segments)?)
            .header(reqwest::header::ACCEPT, "application/json"))
    }
}

fn endpoint(base_url: &Url, segments: &[&str]) -> Result<Url, AuthServiceError> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|()| AuthServiceError::transport(format!("invalid auth base URL {base_url}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn map_transport_error(error: reqwest::Error) -> AuthServiceError {
    AuthServiceError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &str) -> AuthServiceError {
    if status.is_server_error() {
        AuthServiceError::transport(format!("status {}", status.as_u16()))
    } else {
        AuthServiceError::rejected(status.as_u16(), body.chars().take(160).collect::<String>())
    }
}

async fn send(request: RequestBuilder) -> Result<reqwest::Response, AuthServiceError> {
    let response = request.send().await.map_err(map_transport_error)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(map_status_error(status, &body))
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AuthServiceError> {
    let body = response.bytes().await.map_err(map_transport_error)?;
    serde_json::from_slice(&body).map_err(|err| AuthServiceError::decode(err.to_string()))
}

#[async_trait]
impl AuthenticationMethodResolver for HttpAuthService {
    async fn resolve(&self, token: &str) -> Result<Option<AuthenticatedSession>, AuthServiceError> {
        let request = self
            .request(Method::POST, &["sessions", "validate"])?
            .bearer_auth(token);
        match send(request).await {
            Ok(response) => {
                let dto: SessionValidationDto = decode(response).await?;
                Ok(Some(dto.into()))
            }
            Err(AuthServiceError::Rejected { status, .. })
                if status == StatusCode::UNAUTHORIZED.as_u16() =>
            {
                debug!("auth service rejected session token");
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }
}

#[async_trait]
impl AuthService for HttpAuthService {
    async fn save_user_mfa(
        &self,
        user_uuid: &UserId,
        item_uuid: &Uuid,
        secret: &str,
    ) -> Result<(), AuthServiceError> {
        let request = self
            .request(Method::PUT, &["users", user_uuid.as_ref(), "mfa"])?
            .json(&MfaSecretDto {
                item_uuid: *item_uuid,
                secret,
            });
        send(request).await.map(|_| ())
    }

    async fn remove_user_mfa(&self, user_uuid: &UserId) -> Result<(), AuthServiceError> {
        let request = self.request(Method::DELETE, &["users", user_uuid.as_ref(), "mfa"])?;
        send(request).await.map(|_| ())
    }

    async fn set_mfa_transition(
        &self,
        user_uuid: &UserId,
        transition: MfaTransition,
    ) -> Result<(), AuthServiceError> {
        let request = self
            .request(Method::PUT, &["users", user_uuid.as_ref(), "settings"])?
            .json(&SettingDto {
                name: MFA_TRANSITION_SETTING,
                value: transition.as_str(),
            });
        send(request).await.map(|_| ())
    }

    async fn revision_history_days(
        &self,
        user_uuid: &UserId,
    ) -> Result<Option<u32>, AuthServiceError> {
        let request = self.request(
            Method::GET,
            &["users", user_uuid.as_ref(), "features", "revision-history"],
        )?;
        let dto: RevisionHistoryDto = decode(send(request).await?).await?;
        Ok(dto.days)
    }
}

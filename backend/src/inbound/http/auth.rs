//! Bearer token authentication for HTTP handlers.
//!
//! The token is resolved through the [`AuthenticationMethodResolver`] port
//! held in [`HttpState`]. Handlers take a [`BearerSession`] argument and
//! never see the raw header.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::domain::ports::{AuthServiceError, AuthenticatedSession, AuthenticationMethodResolver};
use crate::domain::{Error, UserId};

use super::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// Authenticated caller resolved from `Authorization: Bearer <token>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerSession(AuthenticatedSession);

impl BearerSession {
    pub fn user_uuid(&self) -> &UserId {
        &self.0.user_uuid
    }

    pub fn read_only_access(&self) -> bool {
        self.0.read_only_access
    }
}

fn bearer_token(req: &HttpRequest) -> Result<String, Error> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing authorization header"))?;
    let value = header
        .to_str()
        .map_err(|_| Error::unauthorized("malformed authorization header"))?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("authorization header must carry a bearer token"))?;
    Ok(token.to_owned())
}

fn map_resolver_error(error: AuthServiceError) -> Error {
    match error {
        AuthServiceError::Transport { message } => {
            Error::service_unavailable(format!("auth service unavailable: {message}"))
        }
        other => Error::internal(other.to_string()),
    }
}

async fn resolve_session(
    resolver: &dyn AuthenticationMethodResolver,
    token: &str,
) -> Result<BearerSession, Error> {
    match resolver.resolve(token).await.map_err(map_resolver_error)? {
        Some(session) => Ok(BearerSession(session)),
        None => {
            debug!("bearer token did not resolve to a session");
            Err(Error::unauthorized("invalid session"))
        }
    }
}

impl FromRequest for BearerSession {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = bearer_token(req);
        Box::pin(async move {
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let token = token?;
            resolve_session(state.authentication.as_ref(), &token).await
        })
    }
}

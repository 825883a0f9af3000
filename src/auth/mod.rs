//! Authentication: the optional PSK gate and bearer-token callers.
//!
//! The PSK check uses constant-time comparison to mitigate timing attacks.

pub mod password;

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::db::TokenKind;
use crate::errors::AppError;
use crate::models::{Employer, JobSeeker, User};
use crate::AppState;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// PSK authentication layer function that takes the expected PSK as a parameter.
///
/// Only `x-api-key` is consulted; `Authorization` carries user tokens.
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    // If no PSK is configured, allow all requests (dev mode)
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if constant_time_compare(key, &expected) => next.run(request).await,
        Some(_) => AppError::Unauthorized("Invalid API key".to_string()).into_response(),
        None => AppError::Unauthorized("Missing API key".to_string()).into_response(),
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// The authenticated user behind a request.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user: User,
}

impl Caller {
    pub fn id(&self) -> &str {
        &self.user.id
    }

    /// The caller's employer profile, or 403 when they are not an employer.
    pub async fn employer(&self, state: &AppState) -> Result<Employer, AppError> {
        state
            .repo
            .employer_for_user(self.id())
            .await?
            .ok_or_else(|| AppError::Forbidden("Only employers may do this.".to_string()))
    }

    /// The caller's job-seeker profile, or 403 when they are not a job seeker.
    pub async fn job_seeker(&self, state: &AppState) -> Result<JobSeeker, AppError> {
        state
            .repo
            .job_seeker_for_user(self.id())
            .await?
            .ok_or_else(|| AppError::Forbidden("Only job seekers may do this.".to_string()))
    }

    /// 403 unless the caller owns the resource.
    pub fn ensure_owns(&self, owner_user_id: &str) -> Result<(), AppError> {
        if self.id() == owner_user_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You do not have permission to perform this action.".to_string(),
            ))
        }
    }
}

/// Resolve the bearer token of a request, if any.
///
/// No `Authorization` header means an anonymous caller; a header that names no live access
/// token is rejected.
pub async fn resolve_caller(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<Caller>, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Malformed Authorization header".to_string()))?;

    let user = state
        .repo
        .user_for_token(token, TokenKind::Access)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid or revoked token".to_string()))?;

    Ok(Some(Caller { user }))
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        resolve_caller(state, &parts.headers).await?.ok_or_else(|| {
            AppError::Unauthorized("Authentication credentials were not provided.".to_string())
        })
    }
}

//! Account recovery endpoints.

use axum::{extract::State, Json};
use chrono::Duration;

use super::{success, ApiResult};
use crate::auth::password::hash_password;
use crate::errors::AppError;
use crate::models::{PasswordResetConfirm, PasswordResetRequest, StatusReply};
use crate::notify::{Activity, Context};
use crate::AppState;

/// How long a reset token stays valid.
const RESET_TOKEN_TTL_HOURS: i64 = 24;

/// POST /api/password-reset - Send a reset link to the account's email.
///
/// Answers the same whether or not the email is registered.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetRequest>,
) -> ApiResult<StatusReply> {
    let Some((user, _)) = state.repo.find_user_by_email(&request.email).await? else {
        tracing::debug!("Password reset requested for unknown email");
        return success(StatusReply { status: "OK" });
    };

    let token = state
        .repo
        .create_reset_token(&user.id, Duration::hours(RESET_TOKEN_TTL_HOURS))
        .await?;

    let mut context = Context::new();
    context.insert("username".to_string(), user.username.clone());
    context.insert("email".to_string(), user.email.clone());
    context.insert(
        "reset_password_url".to_string(),
        format!(
            "{}/password-reset/confirm?token={}",
            state.config.public_url.trim_end_matches('/'),
            token
        ),
    );

    if let Err(e) = state
        .notifier
        .notify(Activity::UserResetsPassword, &context, &[user.email])
    {
        tracing::warn!("Failed to send password reset notification: {}", e);
    }

    success(StatusReply { status: "OK" })
}

/// POST /api/password-reset/confirm - Set a new password with a reset token.
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetConfirm>,
) -> ApiResult<StatusReply> {
    request.validate()?;
    let hash = hash_password(&request.password, state.config.bcrypt_cost).await?;

    let user_id = state
        .repo
        .consume_reset_token(request.token.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("Reset token is invalid or has expired".to_string()))?;

    state.repo.set_password(&user_id, &hash).await?;
    tracing::info!("Password reset for user {}", user_id);

    success(StatusReply { status: "OK" })
}

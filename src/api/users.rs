//! User account and token endpoints.
//!
//! Each account operation is a [`UserAction`]; the action fixes who may perform it.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};

use super::{created, success, ApiResult};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{resolve_caller, Caller};
use crate::db::TokenKind;
use crate::errors::AppError;
use crate::models::{
    AccessToken, AuthTokens, CreateUserRequest, LoginRequest, RefreshRequest, UpdateUserRequest,
    User, UserWithTokens,
};
use crate::AppState;

/// Operations on user accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Create,
    Retrieve,
    Update,
    Me,
}

/// Who may perform an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Anyone,
    Authenticated,
    /// Authenticated and addressing their own account
    SelfOnly,
}

impl UserAction {
    pub fn access(self) -> Access {
        match self {
            UserAction::Create | UserAction::Retrieve => Access::Anyone,
            UserAction::Me => Access::Authenticated,
            UserAction::Update => Access::SelfOnly,
        }
    }

    /// Check `caller` against this action's policy. `target` is the account the action addresses.
    pub fn authorize(self, caller: Option<&Caller>, target: Option<&str>) -> Result<(), AppError> {
        let require_caller = || {
            caller.ok_or_else(|| {
                AppError::Unauthorized("Authentication credentials were not provided.".to_string())
            })
        };

        match self.access() {
            Access::Anyone => Ok(()),
            Access::Authenticated => require_caller().map(|_| ()),
            Access::SelfOnly => {
                let caller = require_caller()?;
                caller.ensure_owns(target.unwrap_or_default())
            }
        }
    }
}

/// Fill the derived URL fields of a user.
pub(super) fn present_user(state: &AppState, mut user: User) -> User {
    user.profile_picture_url = user
        .profile_picture
        .as_deref()
        .and_then(|key| state.media.resolve(key));
    user
}

/// POST /api/users - Create an account and log it in.
pub async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<UserWithTokens> {
    let caller = resolve_caller(&state, &headers).await?;
    UserAction::Create.authorize(caller.as_ref(), None)?;
    request.validate()?;

    let hash = hash_password(&request.password, state.config.bcrypt_cost).await?;
    let user = state.repo.create_user(&request, &hash).await?;
    let tokens = state.repo.issue_tokens(&user.id).await?;

    created(UserWithTokens {
        user: present_user(&state, user),
        tokens,
    })
}

/// GET /api/users/{id} - Get a single user.
pub async fn get_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<User> {
    let caller = resolve_caller(&state, &headers).await?;
    UserAction::Retrieve.authorize(caller.as_ref(), Some(&id))?;

    match state.repo.get_user(&id).await? {
        Some(user) => success(present_user(&state, user)),
        None => Err(AppError::NotFound(format!("User {} not found", id))),
    }
}

/// PUT /api/users/{id} - Update one's own account.
pub async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> ApiResult<User> {
    let caller = resolve_caller(&state, &headers).await?;
    UserAction::Update.authorize(caller.as_ref(), Some(&id))?;
    request.validate()?;

    let user = state.repo.update_user(&id, &request).await?;
    success(present_user(&state, user))
}

/// GET /api/users/me - The authenticated user.
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<User> {
    let caller = resolve_caller(&state, &headers).await?;
    UserAction::Me.authorize(caller.as_ref(), None)?;

    match caller {
        Some(caller) => success(present_user(&state, caller.user)),
        None => Err(AppError::Unauthorized(
            "Authentication credentials were not provided.".to_string(),
        )),
    }
}

/// POST /api/auth/token - Exchange email and password for tokens.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<AuthTokens> {
    let rejected =
        || AppError::Unauthorized("No active account found with the given credentials".to_string());

    let (user, hash) = state
        .repo
        .find_user_by_email(&request.email)
        .await?
        .ok_or_else(rejected)?;

    if !verify_password(&request.password, &hash).await? {
        tracing::info!("Failed login for user {}", user.id);
        return Err(rejected());
    }

    success(state.repo.issue_tokens(&user.id).await?)
}

/// POST /api/auth/token/refresh - Exchange a refresh token for a new access token.
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<AccessToken> {
    let user = state
        .repo
        .user_for_token(&request.refresh, TokenKind::Refresh)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Token is invalid or expired".to_string()))?;

    let access = state.repo.issue_token(&user.id, TokenKind::Access).await?;
    success(AccessToken { access })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(id: &str) -> Caller {
        Caller {
            user: User {
                id: id.to_string(),
                email: format!("{id}@example.com"),
                username: id.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                profile_picture: None,
                profile_picture_url: None,
                created_at: String::new(),
                updated_at: String::new(),
            },
        }
    }

    #[test]
    fn test_anonymous_access() {
        assert!(UserAction::Create.authorize(None, None).is_ok());
        assert!(UserAction::Retrieve.authorize(None, Some("u1")).is_ok());
        assert!(matches!(
            UserAction::Me.authorize(None, None),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            UserAction::Update.authorize(None, Some("u1")),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_update_is_limited_to_self() {
        let me = caller("u1");
        assert!(UserAction::Update.authorize(Some(&me), Some("u1")).is_ok());
        assert!(matches!(
            UserAction::Update.authorize(Some(&me), Some("u2")),
            Err(AppError::Forbidden(_))
        ));
    }
}

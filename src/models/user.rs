//! User accounts, credentials and account recovery payloads.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::validation::Validator;

pub const MIN_PASSWORD_LENGTH: usize = 8;
/// bcrypt only looks at the first 72 bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// A registered account. Employer and job-seeker profiles hang off a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Opaque bearer credentials handed to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access: String,
    pub refresh: String,
}

/// Response to account creation.
#[derive(Debug, Clone, Serialize)]
pub struct UserWithTokens {
    #[serde(flatten)]
    pub user: User,
    pub tokens: AuthTokens,
}

/// Request body for creating a new account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.text("username", &self.username, 150)
            .text("email", &self.email, 255)
            .max_len("firstName", &self.first_name, 150)
            .max_len("lastName", &self.last_name, 150)
            .optional_text("profilePicture", self.profile_picture.as_deref(), 100);
        if !self.email.trim().is_empty() && !looks_like_email(&self.email) {
            v.add("email", "Enter a valid email address.");
        }
        check_password(&mut v, "password", &self.password);
        v.finish()
    }
}

/// Request body for updating an account. Email and username are fixed after creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.optional_text("firstName", self.first_name.as_deref(), 150)
            .optional_text("lastName", self.last_name.as_deref(), 150)
            .optional_text("profilePicture", self.profile_picture.as_deref(), 100);
        v.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub password: String,
}

impl PasswordResetConfirm {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        check_password(&mut v, "password", &self.password);
        v.finish()
    }
}

/// Status-only acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReply {
    pub status: &'static str,
}

fn check_password(v: &mut Validator, field: &str, password: &str) {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        v.add(
            field,
            format!(
                "Ensure this field has at least {} characters.",
                MIN_PASSWORD_LENGTH
            ),
        );
    } else if password.len() > MAX_PASSWORD_BYTES {
        v.add(
            field,
            format!("Ensure this field has no more than {} bytes.", MAX_PASSWORD_BYTES),
        );
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.trim().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

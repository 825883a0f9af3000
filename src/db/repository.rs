//! Database repository: accounts, credentials and addresses.
//!
//! Domain tables live in sibling modules as further `impl Repository` blocks.

use chrono::{DateTime, Duration, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::{is_unique_violation, AppError};
use crate::models::{
    Address, AuthTokens, CreateAddressRequest, CreateUserRequest, UpdateUserRequest, User,
};

/// Which kind of bearer token a row represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pub(super) pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== USER OPERATIONS ====================

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, username, first_name, last_name, profile_picture, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Look up a user and their password hash by email.
    pub async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, username, first_name, last_name, profile_picture, created_at, updated_at, password_hash FROM users WHERE email = ?",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .as_ref()
            .map(|row| (user_from_row(row), row.get("password_hash"))))
    }

    /// Create a new user. The password must already be hashed.
    pub async fn create_user(
        &self,
        request: &CreateUserRequest,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let email = request.email.trim();

        let result = sqlx::query(
            "INSERT INTO users (id, email, username, password_hash, first_name, last_name, profile_picture, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(email)
        .bind(request.username.trim())
        .bind(password_hash)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(&request.profile_picture)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::field(
                    "email",
                    "user with this email address already exists.",
                ));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!("Created user {}", id);

        Ok(User {
            id,
            email: email.to_string(),
            username: request.username.trim().to_string(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            profile_picture: request.profile_picture.clone(),
            profile_picture_url: None,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Update the editable account fields.
    pub async fn update_user(&self, id: &str, request: &UpdateUserRequest) -> Result<User, AppError> {
        let existing = self
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        let now = Utc::now().to_rfc3339();
        let first_name = request.first_name.clone().unwrap_or(existing.first_name);
        let last_name = request.last_name.clone().unwrap_or(existing.last_name);
        let profile_picture = request
            .profile_picture
            .clone()
            .or(existing.profile_picture);

        sqlx::query(
            "UPDATE users SET first_name = ?, last_name = ?, profile_picture = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&first_name)
        .bind(&last_name)
        .bind(&profile_picture)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id: existing.id,
            email: existing.email,
            username: existing.username,
            first_name,
            last_name,
            profile_picture,
            profile_picture_url: None,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Replace a user's password hash and revoke their outstanding tokens.
    pub async fn set_password(&self, user_id: &str, password_hash: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now().to_rfc3339())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        sqlx::query("DELETE FROM auth_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // ==================== TOKEN OPERATIONS ====================

    /// Issue a fresh access/refresh token pair.
    pub async fn issue_tokens(&self, user_id: &str) -> Result<AuthTokens, AppError> {
        let access = self.issue_token(user_id, TokenKind::Access).await?;
        let refresh = self.issue_token(user_id, TokenKind::Refresh).await?;
        Ok(AuthTokens { access, refresh })
    }

    /// Store and return a new opaque token.
    pub async fn issue_token(&self, user_id: &str, kind: TokenKind) -> Result<String, AppError> {
        let token = new_token();
        sqlx::query("INSERT INTO auth_tokens (token, user_id, kind, created_at) VALUES (?, ?, ?, ?)")
            .bind(&token)
            .bind(user_id)
            .bind(kind.as_str())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(token)
    }

    /// Resolve a bearer token of the given kind to its user.
    pub async fn user_for_token(
        &self,
        token: &str,
        kind: TokenKind,
    ) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            r#"SELECT u.id, u.email, u.username, u.first_name, u.last_name, u.profile_picture,
                      u.created_at, u.updated_at
               FROM auth_tokens t JOIN users u ON u.id = t.user_id
               WHERE t.token = ? AND t.kind = ?"#,
        )
        .bind(token)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    // ==================== PASSWORD RESET OPERATIONS ====================

    /// Create a single-use reset token valid for `ttl`.
    pub async fn create_reset_token(&self, user_id: &str, ttl: Duration) -> Result<String, AppError> {
        let token = new_token();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO password_reset_tokens (token, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&token)
        .bind(user_id)
        .bind((now + ttl).to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(token)
    }

    /// Consume a reset token, returning its user when it exists and has not expired.
    ///
    /// An expired token is removed on its own. A valid one invalidates every reset token of its
    /// user, so a token works at most once.
    pub async fn consume_reset_token(&self, token: &str) -> Result<Option<String>, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "DELETE FROM password_reset_tokens WHERE token = ? RETURNING user_id, expires_at",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let user_id: String = row.get("user_id");
        let expires_at: String = row.get("expires_at");

        let expired = DateTime::parse_from_rfc3339(&expires_at)
            .map(|at| at.with_timezone(&Utc) <= Utc::now())
            .unwrap_or(true);
        if expired {
            tx.commit().await?;
            tracing::info!("Rejected expired password reset token for user {}", user_id);
            return Ok(None);
        }

        sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = ?")
            .bind(&user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Some(user_id))
    }

    // ==================== ADDRESS OPERATIONS ====================

    /// List all addresses.
    pub async fn list_addresses(&self) -> Result<Vec<Address>, AppError> {
        let rows = sqlx::query("SELECT id, user_id, country, city, street FROM addresses ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(address_from_row).collect())
    }

    /// Addresses belonging to one user.
    pub async fn addresses_for_user(&self, user_id: &str) -> Result<Vec<Address>, AppError> {
        let rows = sqlx::query(
            "SELECT id, user_id, country, city, street FROM addresses WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(address_from_row).collect())
    }

    /// Case-insensitive substring search over country and city.
    pub async fn search_addresses(&self, term: &str) -> Result<Vec<Address>, AppError> {
        let term = term.trim();
        if term.is_empty() {
            return self.list_addresses().await;
        }

        let pattern = like_pattern(term);
        let rows = sqlx::query(
            r#"SELECT id, user_id, country, city, street FROM addresses
               WHERE country LIKE ? ESCAPE '\' OR city LIKE ? ESCAPE '\'
               ORDER BY id"#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(address_from_row).collect())
    }

    /// Create the address of a user. A user has at most one.
    pub async fn create_address(
        &self,
        user_id: &str,
        request: &CreateAddressRequest,
    ) -> Result<Address, AppError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO addresses (user_id, country, city, street, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(request.country.trim())
        .bind(request.city.trim())
        .bind(request.street.trim())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(result) => Ok(Address {
                id: result.last_insert_rowid(),
                user_id: user_id.to_string(),
                country: request.country.trim().to_string(),
                city: request.city.trim().to_string(),
                street: request.street.trim().to_string(),
            }),
            Err(e) if is_unique_violation(&e) => {
                Err(AppError::Conflict("User already has an address".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

// Helper functions for row conversion

pub(super) fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        profile_picture: row.get("profile_picture"),
        profile_picture_url: None,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn address_from_row(row: &sqlx::sqlite::SqliteRow) -> Address {
    Address {
        id: row.get("id"),
        user_id: row.get("user_id"),
        country: row.get("country"),
        city: row.get("city"),
        street: row.get("street"),
    }
}

/// `%term%` with LIKE wildcards in `term` escaped by backslash.
pub(super) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn new_token() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::models::{RefreshTokenModel, UserModel};
use super::types::{Gender, Role};
use crate::shared::AppError;

/// Persistence of identities and refresh tokens
#[async_trait]
pub trait CredentialStore {
    /// Inserts a new user. Fails with `AlreadyExists` when the login or email is taken.
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError>;
    async fn find_user_by_login(&self, login: &str) -> Result<Option<UserModel>, AppError>;
    /// Stores the user's refresh token, replacing any previous one
    async fn upsert_refresh_token(&self, token: &RefreshTokenModel) -> Result<(), AppError>;
    async fn get_refresh_token(&self, user_id: Uuid)
        -> Result<Option<RefreshTokenModel>, AppError>;
    /// Removes the user's refresh token, returning whether one existed
    async fn delete_refresh_token(&self, user_id: Uuid) -> Result<bool, AppError>;
    async fn cleanup_expired_refresh_tokens(&self) -> Result<u64, AppError>;
}

/// In-memory implementation of CredentialStore for development and testing
///
/// Data is stored in memory and will be lost when the application restarts.
pub struct InMemoryCredentialStore {
    users: Mutex<HashMap<String, UserModel>>, // login -> user
    refresh_tokens: Mutex<HashMap<Uuid, RefreshTokenModel>>, // user_id -> token
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, op: &'static str) -> Result<MutexGuard<'a, T>, AppError> {
    mutex
        .lock()
        .map_err(|_| AppError::internal("in-memory store lock poisoned", op))
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            refresh_tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the current number of users in the store
    pub fn user_count(&self) -> usize {
        self.users.lock().map(|users| users.len()).unwrap_or(0)
    }

    /// Returns the current number of stored refresh tokens
    pub fn refresh_token_count(&self) -> usize {
        self.refresh_tokens
            .lock()
            .map(|tokens| tokens.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    #[instrument(skip(self, user), fields(user_id = %user.id, login = %user.login))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!("Creating user in memory");

        let mut users = lock(&self.users, "store.create_user")?;
        if users.contains_key(&user.login) || users.values().any(|u| u.email == user.email) {
            warn!("User already exists in memory");
            return Err(AppError::already_exists(
                "user with this login or email already exists",
                "store.create_user",
            ));
        }
        users.insert(user.login.clone(), user.clone());

        debug!("User created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_user_by_login(&self, login: &str) -> Result<Option<UserModel>, AppError> {
        let users = lock(&self.users, "store.find_user_by_login")?;
        let user = users.get(login).cloned();

        match &user {
            Some(u) => debug!(user_id = %u.id, "User found in memory"),
            None => debug!("User not found in memory"),
        }

        Ok(user)
    }

    #[instrument(skip(self, token), fields(user_id = %token.user_id))]
    async fn upsert_refresh_token(&self, token: &RefreshTokenModel) -> Result<(), AppError> {
        let mut tokens = lock(&self.refresh_tokens, "store.upsert_refresh_token")?;
        let replaced = tokens.insert(token.user_id, token.clone()).is_some();

        debug!(replaced, "Refresh token stored in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_refresh_token(
        &self,
        user_id: Uuid,
    ) -> Result<Option<RefreshTokenModel>, AppError> {
        let tokens = lock(&self.refresh_tokens, "store.get_refresh_token")?;
        Ok(tokens.get(&user_id).cloned())
    }

    #[instrument(skip(self))]
    async fn delete_refresh_token(&self, user_id: Uuid) -> Result<bool, AppError> {
        let mut tokens = lock(&self.refresh_tokens, "store.delete_refresh_token")?;
        let removed = tokens.remove(&user_id).is_some();

        debug!(removed, "Refresh token deleted from memory");
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn cleanup_expired_refresh_tokens(&self) -> Result<u64, AppError> {
        let mut tokens = lock(&self.refresh_tokens, "store.cleanup_expired_refresh_tokens")?;
        let now = Utc::now();
        let initial_count = tokens.len();

        tokens.retain(|_, token| token.expires_at > now);

        let removed_count = initial_count - tokens.len();
        debug!(
            expired_tokens_removed = removed_count,
            "Expired refresh tokens cleaned up from memory"
        );
        Ok(removed_count as u64)
    }
}

/// PostgreSQL implementation of CredentialStore
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<UserModel, AppError> {
    let op = "store.find_user_by_login";
    let map_err = |e: sqlx::Error| AppError::internal(e.to_string(), op);

    let gender: String = row.try_get("gender").map_err(map_err)?;
    let role: String = row.try_get("role").map_err(map_err)?;

    Ok(UserModel {
        id: row.try_get("id").map_err(map_err)?,
        email: row.try_get("email").map_err(map_err)?,
        login: row.try_get("login").map_err(map_err)?,
        password_hash: row.try_get("password_hash").map_err(map_err)?,
        name: row.try_get("name").map_err(map_err)?,
        age: row.try_get("age").map_err(map_err)?,
        gender: Gender::from_str(&gender)
            .map_err(|_| AppError::internal(format!("unknown gender {gender}"), op))?,
        role: Role::from_str(&role)
            .map_err(|_| AppError::internal(format!("unknown role {role}"), op))?,
        avatar: row.try_get("avatar").map_err(map_err)?,
        verified: row.try_get("verified").map_err(map_err)?,
        banned: row.try_get("banned").map_err(map_err)?,
        created_at: row.try_get("created_at").map_err(map_err)?,
        updated_at: row.try_get("updated_at").map_err(map_err)?,
    })
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    #[instrument(skip(self, user), fields(user_id = %user.id, login = %user.login))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!("Creating user in database");

        sqlx::query(
            "INSERT INTO users (id, email, login, password_hash, name, age, gender, role, avatar, verified, banned, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.login)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.age)
        .bind(user.gender.to_string())
        .bind(user.role.to_string())
        .bind(&user.avatar)
        .bind(user.verified)
        .bind(user.banned)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                warn!(constraint = ?db_err.constraint(), "User already exists in database");
                AppError::already_exists(
                    "user with this login or email already exists",
                    "store.create_user",
                )
            }
            e => {
                warn!(error = %e, "Failed to create user in database");
                AppError::internal(e.to_string(), "store.create_user")
            }
        })?;

        debug!("User created successfully in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_user_by_login(&self, login: &str) -> Result<Option<UserModel>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, login, password_hash, name, age, gender, role, avatar, verified, banned, created_at, updated_at \
             FROM users WHERE login = $1",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch user from database");
            AppError::internal(e.to_string(), "store.find_user_by_login")
        })?;

        match row {
            Some(row) => {
                let user = user_from_row(&row)?;
                debug!(user_id = %user.id, "User found in database");
                Ok(Some(user))
            }
            None => {
                debug!("User not found in database");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, token), fields(user_id = %token.user_id))]
    async fn upsert_refresh_token(&self, token: &RefreshTokenModel) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO refresh_tokens (user_id, token, expires_at, user_agent) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id) DO UPDATE SET token = EXCLUDED.token, expires_at = EXCLUDED.expires_at, user_agent = EXCLUDED.user_agent",
        )
        .bind(token.user_id)
        .bind(&token.token)
        .bind(token.expires_at)
        .bind(&token.user_agent)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to store refresh token");
            AppError::internal(e.to_string(), "store.upsert_refresh_token")
        })?;

        debug!("Refresh token stored in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_refresh_token(
        &self,
        user_id: Uuid,
    ) -> Result<Option<RefreshTokenModel>, AppError> {
        let op = "store.get_refresh_token";
        let row = sqlx::query(
            "SELECT token, user_id, expires_at, user_agent FROM refresh_tokens WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch refresh token");
            AppError::internal(e.to_string(), op)
        })?;

        row.map(|row| -> Result<RefreshTokenModel, sqlx::Error> {
            Ok(RefreshTokenModel {
                token: row.try_get("token")?,
                user_id: row.try_get("user_id")?,
                expires_at: row.try_get("expires_at")?,
                user_agent: row.try_get("user_agent")?,
            })
        })
        .transpose()
        .map_err(|e| AppError::internal(e.to_string(), op))
    }

    #[instrument(skip(self))]
    async fn delete_refresh_token(&self, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to delete refresh token");
                AppError::internal(e.to_string(), "store.delete_refresh_token")
            })?;

        let removed = result.rows_affected() > 0;
        debug!(removed, "Refresh token deleted from database");
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn cleanup_expired_refresh_tokens(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to cleanup expired refresh tokens");
                AppError::internal(e.to_string(), "store.cleanup_expired_refresh_tokens")
            })?;

        let rows_affected = result.rows_affected();
        debug!(
            expired_tokens_removed = rows_affected,
            "Expired refresh tokens cleaned up"
        );
        Ok(rows_affected)
    }
}

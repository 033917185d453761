use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    hasher::CredentialHasher,
    models::{NewUser, RefreshTokenModel, UserModel},
    repository::CredentialStore,
    token::TokenIssuer,
    types::{AccessClaims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
    validation::{validate_login, validate_registration},
};
use crate::shared::AppError;

/// Message shared by the unknown-login and wrong-password branches
pub const INVALID_CREDENTIALS_MESSAGE: &str = "invalid login or password";

/// Result of a successful login
#[derive(Debug)]
pub struct LoginOutcome {
    pub response: LoginResponse,
    /// Handed to the transport, which stores it in an HttpOnly cookie
    pub refresh_token: RefreshTokenModel,
}

/// Orchestrates registration, login and logout
pub struct AuthService {
    store: Arc<dyn CredentialStore + Send + Sync>,
    hasher: CredentialHasher,
    token_issuer: TokenIssuer,
    store_timeout: Duration,
    /// Verified against when the login is unknown so both failure branches
    /// spend comparable time hashing
    dummy_hash: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore + Send + Sync>,
        hasher: CredentialHasher,
        token_issuer: TokenIssuer,
        store_timeout: Duration,
    ) -> Result<Self, AppError> {
        let dummy_hash = hasher.hash("placeholder-for-unknown-logins")?;

        Ok(Self {
            store,
            hasher,
            token_issuer,
            store_timeout,
            dummy_hash,
        })
    }

    pub fn token_issuer(&self) -> &TokenIssuer {
        &self.token_issuer
    }

    /// Bounds a store call by the configured deadline
    async fn with_deadline<T, F>(&self, op: &'static str, call: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, timeout_ms = self.store_timeout.as_millis() as u64, "Store call timed out");
                Err(AppError::internal("credential store deadline exceeded", op))
            }
        }
    }

    /// Validates input, hashes the password and stores a new identity
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: RegisterRequest) -> Result<RegisterResponse, AppError> {
        let valid = validate_registration(request)?;
        info!(login = %valid.login, "Registering user");

        let password_hash = self.hasher.hash_async(valid.password).await?;

        let user = UserModel::new(NewUser {
            email: valid.email,
            login: valid.login,
            password_hash,
            name: valid.name,
            age: valid.age,
            gender: valid.gender,
        });

        self.with_deadline("auth.register", self.store.create_user(&user))
            .await?;

        info!(user_id = %user.id, login = %user.login, "User registered");
        Ok(RegisterResponse::from(&user))
    }

    /// Verifies credentials, issues tokens and replaces the stored refresh token
    #[instrument(skip(self, request, user_agent))]
    pub async fn login(
        &self,
        request: LoginRequest,
        user_agent: Option<String>,
    ) -> Result<LoginOutcome, AppError> {
        let valid = validate_login(request)?;
        info!(login = %valid.login, "Login attempt");

        let user = self
            .with_deadline("auth.login", self.store.find_user_by_login(&valid.login))
            .await?;

        let user = match user {
            Some(user) => {
                let matches = self
                    .hasher
                    .verify_async(valid.password, user.password_hash.clone())
                    .await;
                if !matches {
                    warn!(login = %valid.login, "Login rejected");
                    return Err(invalid_credentials());
                }
                user
            }
            None => {
                self.hasher
                    .verify_async(valid.password, self.dummy_hash.clone())
                    .await;
                warn!(login = %valid.login, "Login rejected");
                return Err(invalid_credentials());
            }
        };

        let (refresh_token, access_token) = self.token_issuer.issue_tokens(&user, user_agent)?;

        self.with_deadline("auth.login", self.store.upsert_refresh_token(&refresh_token))
            .await?;

        info!(user_id = %user.id, "Login succeeded");

        Ok(LoginOutcome {
            response: LoginResponse {
                token: access_token,
                id: user.id,
                name: user.name,
                email: user.email,
                gender: user.gender,
                role: user.role,
            },
            refresh_token,
        })
    }

    /// Revokes the stored refresh token of a user. Idempotent.
    #[instrument(skip(self))]
    pub async fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        let removed = self
            .with_deadline("auth.logout", self.store.delete_refresh_token(user_id))
            .await?;

        info!(user_id = %user_id, removed, "Logged out");
        Ok(())
    }

    /// Verifies an access token presented by a client
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AppError> {
        self.token_issuer.verify_access_token(token)
    }

    /// Removes expired refresh tokens from the store
    #[instrument(skip(self))]
    pub async fn cleanup_expired_refresh_tokens(&self) -> Result<u64, AppError> {
        let removed = self
            .with_deadline(
                "auth.cleanup_expired_refresh_tokens",
                self.store.cleanup_expired_refresh_tokens(),
            )
            .await?;

        info!(removed_tokens = removed, "Expired refresh tokens cleanup completed");
        Ok(removed)
    }
}

fn invalid_credentials() -> AppError {
    AppError::not_found(INVALID_CREDENTIALS_MESSAGE, "auth.login")
}

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::{Gender, Role};

/// Database model for the users table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserModel {
    pub id: Uuid,
    pub email: String,
    pub login: String, // Unique across all users
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub age: i32,
    pub gender: Gender,
    pub role: Role,
    pub avatar: Option<String>,
    pub verified: bool,
    pub banned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated registration data with the password already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub login: String,
    pub password_hash: String,
    pub name: String,
    pub age: i32,
    pub gender: Gender,
}

impl UserModel {
    /// Creates a fresh user row with generated id, default role and flags
    pub fn new(new_user: NewUser) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            email: new_user.email,
            login: new_user.login,
            password_hash: new_user.password_hash,
            name: new_user.name,
            age: new_user.age,
            gender: new_user.gender,
            role: Role::default(),
            avatar: None,
            verified: false,
            banned: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Database model for the refresh_tokens table, one row per user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshTokenModel {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub user_agent: Option<String>,
}

impl RefreshTokenModel {
    pub fn new(token: String, user_id: Uuid, ttl: Duration, user_agent: Option<String>) -> Self {
        Self {
            token,
            user_id,
            expires_at: Utc::now() + ttl,
            user_agent,
        }
    }

    /// Expired tokens are invalid even while still stored
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

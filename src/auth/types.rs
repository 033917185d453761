use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use uuid::Uuid;

use super::models::UserModel;

/// Gender recorded at registration
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

/// Authorization role of an identity
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
pub enum Role {
    #[default]
    User,
    Admin,
    SuperAdmin,
}

/// JWT claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub name: String,
    pub email: String,
    pub gender: Gender,
    pub role: Role,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

/// Request body for POST /register
///
/// Every field is optional on the wire so that a missing field is reported as
/// incorrect data by validation instead of a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
}

/// Request body for POST /login
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub login: Option<String>,
    pub password: Option<String>,
}

/// Public projection of a newly registered identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub verified: bool,
    pub banned: bool,
}

impl From<&UserModel> for RegisterResponse {
    fn from(user: &UserModel) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            created_at: user.created_at,
            verified: user.verified,
            banned: user.banned,
        }
    }
}

/// Response body for POST /login. The refresh token travels separately as a cookie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    pub token: String,
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub gender: Gender,
    pub role: Role,
}

/// Identity snapshot returned by GET /me, read straight from the access token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub gender: Gender,
    pub role: Role,
}

impl From<AccessClaims> for IdentityResponse {
    fn from(claims: AccessClaims) -> Self {
        Self {
            id: claims.sub,
            name: claims.name,
            email: claims.email,
            gender: claims.gender,
            role: claims.role,
        }
    }
}

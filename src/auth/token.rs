use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument};

use super::models::{RefreshTokenModel, UserModel};
use super::types::AccessClaims;
use crate::shared::AppError;

/// Lifetime of a signed access token
pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 5;

/// Lifetime of a stored refresh token
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 30;

const REFRESH_TOKEN_BYTES: usize = 32;

/// Issues HS256 access tokens and opaque refresh tokens, and verifies access tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    /// Builds an issuer from the server signing secret. An empty secret is rejected.
    pub fn new(secret: &str) -> Result<Self, AppError> {
        if secret.is_empty() {
            return Err(AppError::internal(
                "signing secret must not be empty",
                "tokens.new",
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::minutes(ACCESS_TOKEN_TTL_MINUTES),
            refresh_ttl: Duration::days(REFRESH_TOKEN_TTL_DAYS),
        })
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Produces a fresh refresh token and a signed access token for the user
    #[instrument(skip(self, user, user_agent), fields(user_id = %user.id))]
    pub fn issue_tokens(
        &self,
        user: &UserModel,
        user_agent: Option<String>,
    ) -> Result<(RefreshTokenModel, String), AppError> {
        let access_token = self.create_access_token(user)?;
        let refresh_token = RefreshTokenModel::new(
            generate_refresh_token(),
            user.id,
            self.refresh_ttl,
            user_agent,
        );

        debug!(
            refresh_expires_at = %refresh_token.expires_at,
            "Issued access and refresh tokens"
        );

        Ok((refresh_token, access_token))
    }

    fn create_access_token(&self, user: &UserModel) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = (now + self.access_ttl).timestamp().max(0) as usize;

        let claims = AccessClaims {
            sub: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            gender: user.gender,
            role: user.role,
            exp,
            iat: now.timestamp() as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            debug!(error = %e, "Failed to encode access token");
            AppError::internal(e.to_string(), "tokens.issue_tokens")
        })
    }

    /// Checks signature and expiry of an access token and returns its claims
    #[instrument(skip(self, token))]
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map(|data| {
                debug!(user_id = %data.claims.sub, exp = data.claims.exp, "Access token verified");
                data.claims
            })
            .map_err(|e| {
                debug!(error = %e, "Access token rejected");
                AppError::unauthorized("invalid or expired access token", "tokens.verify_access_token")
            })
    }
}

/// 256 random bits from the thread-local CSPRNG, hex encoded
fn generate_refresh_token() -> String {
    let bytes: [u8; REFRESH_TOKEN_BYTES] = rand::random();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::NewUser;
    use crate::auth::types::{Gender, Role};

    fn test_user() -> UserModel {
        UserModel::new(NewUser {
            email: "a@b.com".to_string(),
            login: "sw1ft".to_string(),
            password_hash: "hash".to_string(),
            name: "A".to_string(),
            age: 20,
            gender: Gender::Male,
        })
    }

    #[test]
    fn test_issue_and_verify_access_token() {
        let issuer = TokenIssuer::new("secret").unwrap();
        let user = test_user();

        let (refresh, access) = issuer.issue_tokens(&user, None).unwrap();
        assert!(access.contains('.')); // JWT has dots

        let claims = issuer.verify_access_token(&access).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.name, "A");
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.gender, Gender::Male);
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.exp - claims.iat, 5 * 60);

        assert_eq!(refresh.user_id, user.id);
        assert!(!refresh.is_expired());
        assert!(refresh.expires_at > Utc::now() + Duration::days(29));
    }

    #[test]
    fn test_refresh_tokens_are_random_and_opaque() {
        let issuer = TokenIssuer::new("secret").unwrap();
        let user = test_user();

        let (first, _) = issuer.issue_tokens(&user, Some("curl/8".to_string())).unwrap();
        let (second, _) = issuer.issue_tokens(&user, None).unwrap();

        assert_ne!(first.token, second.token);
        assert_eq!(first.token.len(), 64);
        assert!(first.token.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!first.token.contains(&user.id.to_string()));
        assert_eq!(first.user_agent.as_deref(), Some("curl/8"));
    }

    #[test]
    fn test_expired_access_token_is_rejected() {
        let issuer = TokenIssuer::new("secret")
            .unwrap()
            .with_access_ttl(Duration::minutes(-1));

        let (_, access) = issuer.issue_tokens(&test_user(), None).unwrap();
        let result = issuer.verify_access_token(&access);
        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[test]
    fn test_token_with_different_secret_is_rejected() {
        let issuer = TokenIssuer::new("secret-one").unwrap();
        let other = TokenIssuer::new("secret-two").unwrap();

        let (_, access) = issuer.issue_tokens(&test_user(), None).unwrap();
        assert!(issuer.verify_access_token(&access).is_ok());
        assert!(matches!(
            other.verify_access_token(&access),
            Err(AppError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_invalid_token() {
        let issuer = TokenIssuer::new("secret").unwrap();
        let result = issuer.verify_access_token("invalid.token.here");
        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        assert!(matches!(
            TokenIssuer::new(""),
            Err(AppError::Internal { .. })
        ));
    }
}

use tracing::{debug, instrument, warn};

use crate::shared::AppError;

/// Work factor used for every stored password
pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

/// Lowest work factor bcrypt accepts. Only suitable for tests.
pub const MIN_COST: u32 = 4;

/// bcrypt ignores every byte past this length
pub const MAX_PASSWORD_BYTES: usize = 72;

/// bcrypt-based one-way password hashing
///
/// Each hash embeds its own random salt and the work factor, so verification
/// only needs the plaintext and the stored value.
#[derive(Debug, Clone, Copy)]
pub struct CredentialHasher {
    cost: u32,
}

impl CredentialHasher {
    pub fn new() -> Self {
        Self::with_cost(DEFAULT_COST)
    }

    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hashes a plaintext password with a fresh salt. Passwords longer than
    /// `MAX_PASSWORD_BYTES` are refused rather than truncated.
    #[instrument(skip(self, plaintext), fields(cost = self.cost))]
    pub fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(AppError::incorrect_data(
                format!("password must be at most {MAX_PASSWORD_BYTES} bytes"),
                "hasher.hash",
            ));
        }

        bcrypt::hash(plaintext, self.cost).map_err(|e| {
            warn!(error = %e, "Failed to hash password");
            AppError::internal(e.to_string(), "hasher.hash")
        })
    }

    /// Checks a plaintext against a stored hash. A malformed hash is a mismatch,
    /// and so is an over-long plaintext, since no stored hash can come from one.
    #[instrument(skip(self, plaintext, hashed))]
    pub fn verify(&self, plaintext: &str, hashed: &str) -> bool {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            debug!("Password exceeds bcrypt input limit");
            return false;
        }

        match bcrypt::verify(plaintext, hashed) {
            Ok(matches) => matches,
            Err(e) => {
                debug!(error = %e, "Stored password hash could not be parsed");
                false
            }
        }
    }

    /// Runs `hash` on the blocking pool
    pub async fn hash_async(&self, plaintext: String) -> Result<String, AppError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AppError::internal(e.to_string(), "hasher.hash"))?
    }

    /// Runs `verify` on the blocking pool
    pub async fn verify_async(&self, plaintext: String, hashed: String) -> bool {
        let hasher = *self;
        match tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &hashed)).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!(error = %e, "Password verification task failed");
                false
            }
        }
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new()
    }
}

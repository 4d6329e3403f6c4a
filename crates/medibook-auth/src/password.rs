//! Password hashing and verification
//!
//! Hashes are self-describing strings: bcrypt (`$2b$<cost>$...`) or Argon2
//! PHC (`$argon2id$...`). Verification dispatches on the prefix, so raising
//! the cost or switching algorithm never invalidates stored hashes.

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OnceCell, Semaphore};
use tracing::{debug, warn};

use crate::error::AuthError;

/// Default bcrypt work factor
pub const DEFAULT_COST: u32 = 12;

/// Hash algorithm for new passwords
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Bcrypt,
    /// Argon2id with the crate's default parameters; `cost` is ignored
    Argon2,
}

/// Hash `plaintext` with a fresh random salt
pub fn hash_password(
    plaintext: &str,
    algorithm: HashAlgorithm,
    cost: u32,
) -> Result<String, AuthError> {
    match algorithm {
        HashAlgorithm::Bcrypt => {
            bcrypt::hash(plaintext, cost).map_err(|e| AuthError::PasswordHash(e.to_string()))
        }
        HashAlgorithm::Argon2 => {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(plaintext.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| AuthError::PasswordHash(e.to_string()))
        }
    }
}

/// Verify `plaintext` against a stored hash
///
/// A wrong password is `Ok(false)`; only a corrupt or unrecognized stored
/// hash is an error.
pub fn verify_password(plaintext: &str, stored: &str) -> Result<bool, AuthError> {
    if stored.starts_with("$argon2") {
        let parsed = PasswordHash::new(stored).map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        if parsed.salt.is_none() || parsed.hash.is_none() {
            return Err(AuthError::PasswordHash(
                "argon2 hash is missing its salt or digest".to_string(),
            ));
        }
        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::PasswordHash(e.to_string())),
        }
    } else if stored.starts_with("$2") {
        bcrypt::verify(plaintext, stored).map_err(|e| AuthError::PasswordHash(e.to_string()))
    } else {
        Err(AuthError::PasswordHash("unrecognized hash format".to_string()))
    }
}

/// Hashing settings
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub algorithm: HashAlgorithm,
    pub cost: u32,
    /// Upper bound on hashes computed at once
    pub max_concurrent: usize,
    /// Budget for one hash/verify, including the wait for a worker
    pub timeout: Duration,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Bcrypt,
            cost: DEFAULT_COST,
            max_concurrent: 4,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Runs the slow hash off the async workers with bounded concurrency
#[derive(Clone)]
pub struct PasswordService {
    policy: PasswordPolicy,
    permits: Arc<Semaphore>,
    dummy_hash: Arc<OnceCell<String>>,
}

impl PasswordService {
    pub fn new(policy: PasswordPolicy) -> Self {
        let permits = Arc::new(Semaphore::new(policy.max_concurrent.max(1)));
        Self {
            policy,
            permits,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Hash a new password
    pub async fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        let plaintext = plaintext.to_string();
        let algorithm = self.policy.algorithm;
        let cost = self.policy.cost;
        self.run_blocking(move || hash_password(&plaintext, algorithm, cost))
            .await
    }

    /// Verify a password against a stored hash
    pub async fn verify(&self, plaintext: &str, stored: &str) -> Result<bool, AuthError> {
        let plaintext = plaintext.to_string();
        let stored = stored.to_string();
        self.run_blocking(move || verify_password(&plaintext, &stored))
            .await
    }

    /// Compute the hash used for unknown-account logins ahead of the first request
    pub async fn warm_up(&self) -> Result<(), AuthError> {
        self.absent_hash().await?;
        debug!("Password service ready");
        Ok(())
    }

    /// Spend the same work as a real verification when no principal matched
    pub async fn verify_absent(&self, plaintext: &str) -> Result<(), AuthError> {
        let dummy = self.absent_hash().await?.to_string();
        self.verify(plaintext, &dummy).await?;
        Ok(())
    }

    async fn absent_hash(&self) -> Result<&str, AuthError> {
        self.dummy_hash
            .get_or_try_init(|| self.hash("medibook-absent-principal"))
            .await
            .map(String::as_str)
    }

    async fn run_blocking<T, F>(&self, work: F) -> Result<T, AuthError>
    where
        F: FnOnce() -> Result<T, AuthError> + Send + 'static,
        T: Send + 'static,
    {
        let permits = self.permits.clone();
        let job = async move {
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|_| AuthError::PasswordHash("hashing pool closed".to_string()))?;
            tokio::task::spawn_blocking(move || {
                // Held until the hash finishes, even if the caller timed out
                let _permit = permit;
                work()
            })
            .await
            .map_err(|e| AuthError::PasswordHash(format!("hashing task failed: {}", e)))?
        };

        match tokio::time::timeout(self.policy.timeout, job).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Password hashing exceeded {:?}", self.policy.timeout);
                Err(AuthError::HashTimeout(self.policy.timeout))
            }
        }
    }
}

impl std::fmt::Debug for PasswordService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordService")
            .field("policy", &self.policy)
            .field("available_permits", &self.permits.available_permits())
            .finish()
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        debug!("Using default password policy");
        Self::new(PasswordPolicy::default())
    }
}

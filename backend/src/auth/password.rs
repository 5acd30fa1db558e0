//! Password hashing using bcrypt
//!
//! bcrypt is intentionally CPU-intensive, so the async variants run on the
//! blocking thread pool.

use anyhow::Result;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

const DUMMY_PASSWORD: &str = "dummy-password-for-timing";

/// Hashes verified against when a login names an unknown account, keyed by
/// cost, so the response takes as long as a real mismatch.
static DUMMY_HASHES: Lazy<Mutex<HashMap<u32, String>>> = Lazy::new(Default::default);

/// Password hashing service
pub struct PasswordService;

impl PasswordService {
    /// Hash a password (blocking operation)
    pub fn hash(password: &str, cost: u32) -> Result<String> {
        let cost = cost.max(crate::config::MIN_BCRYPT_COST);
        bcrypt::hash(password, cost).map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
    }

    /// Hash a password on the blocking thread pool
    pub async fn hash_async(password: String, cost: u32) -> Result<String> {
        tokio::task::spawn_blocking(move || Self::hash(&password, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// Verify a password against a hash (blocking operation)
    pub fn verify(password: &str, hash: &str) -> Result<bool> {
        bcrypt::verify(password, hash).map_err(|e| anyhow::anyhow!("Invalid hash format: {}", e))
    }

    /// Verify a password on the blocking thread pool
    pub async fn verify_async(password: String, hash: String) -> Result<bool> {
        tokio::task::spawn_blocking(move || Self::verify(&password, &hash))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// Dummy hash at `cost` (floored like [`Self::hash`]), built on first use
    fn dummy_hash(cost: u32) -> Result<String> {
        let cost = cost.max(crate::config::MIN_BCRYPT_COST);
        let mut hashes = DUMMY_HASHES.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hash) = hashes.get(&cost) {
            return Ok(hash.clone());
        }
        let hash = Self::hash(DUMMY_PASSWORD, cost)?;
        hashes.insert(cost, hash.clone());
        Ok(hash)
    }

    /// Build the dummy hash for `cost` ahead of the first unknown-account login
    pub async fn prepare_dummy(cost: u32) -> Result<()> {
        tokio::task::spawn_blocking(move || Self::dummy_hash(cost).map(drop))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// Burn one verification against the dummy hash for `cost`, the same cost
    /// real accounts are hashed with. The outcome is discarded.
    pub async fn verify_dummy(password: String, cost: u32) {
        let _ = tokio::task::spawn_blocking(move || {
            let hash = Self::dummy_hash(cost)?;
            Self::verify(&password, &hash)
        })
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 10;

    #[test]
    fn test_hash_and_verify() {
        let password = "P@ssw0rd1";
        let hash = PasswordService::hash(password, TEST_COST).unwrap();

        assert!(PasswordService::verify(password, &hash).unwrap());
        assert!(!PasswordService::verify("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_cost_never_below_floor() {
        let hash = PasswordService::hash("P@ssw0rd1", 4).unwrap();
        // bcrypt encodes the cost as $2b$NN$
        assert!(hash.starts_with("$2b$10$"));
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let hash1 = PasswordService::hash("same", TEST_COST).unwrap();
        let hash2 = PasswordService::hash("same", TEST_COST).unwrap();
        assert_ne!(hash1, hash2);
    }

    #[tokio::test]
    async fn test_async_hash_and_verify() {
        let password = "Async#Pass1".to_string();
        let hash = PasswordService::hash_async(password.clone(), TEST_COST).await.unwrap();

        assert!(PasswordService::verify_async(password, hash.clone()).await.unwrap());
        assert!(!PasswordService::verify_async("wrong".to_string(), hash).await.unwrap());
    }

    #[test]
    fn test_dummy_hash_is_valid_bcrypt() {
        let hash = PasswordService::dummy_hash(TEST_COST).unwrap();
        assert!(PasswordService::verify(DUMMY_PASSWORD, &hash).unwrap());
    }

    #[rstest::rstest]
    #[case(10, "$2b$10$")]
    #[case(11, "$2b$11$")]
    #[case(4, "$2b$10$")]
    fn test_dummy_hash_matches_account_cost(#[case] cost: u32, #[case] prefix: &str) {
        let dummy = PasswordService::dummy_hash(cost).unwrap();
        let real = PasswordService::hash("P@ssw0rd1", cost).unwrap();

        assert!(dummy.starts_with(prefix));
        assert_eq!(&dummy[..7], &real[..7]);
    }

    #[tokio::test]
    async fn test_dummy_hash_is_cached_per_cost() {
        PasswordService::prepare_dummy(TEST_COST).await.unwrap();
        let first = PasswordService::dummy_hash(TEST_COST).unwrap();
        let second = PasswordService::dummy_hash(TEST_COST).unwrap();
        assert_eq!(first, second);
    }
}

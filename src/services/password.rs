// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing and verification using Argon2id.
//!
//! Both operations are CPU-bound and run on the blocking pool so a burst of
//! logins does not stall other requests.

use crate::config::Config;
use crate::error::AppError;
use anyhow::anyhow;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::Rng;
use std::sync::Arc;

const SALT_LEN: usize = 16;

/// Hashes and verifies passwords with fixed Argon2id parameters.
#[derive(Clone)]
pub struct PasswordService {
    params: Params,
    /// Verified against when the account does not exist, so that branch
    /// costs as much as a real mismatch.
    dummy_hash: Arc<str>,
}

impl PasswordService {
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, AppError> {
        let params = Params::new(memory_kib, iterations, Params::DEFAULT_P_COST, None)
            .map_err(|e| AppError::Internal(anyhow!("invalid Argon2 parameters: {e}")))?;
        let dummy_hash = hash_with(&params, "academy-dummy-password")?;
        Ok(Self {
            params,
            dummy_hash: dummy_hash.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.password_hash_memory_kib,
            config.password_hash_iterations,
        )
    }

    /// Produce a PHC-format Argon2id hash of `password`.
    pub async fn hash(&self, password: &str) -> Result<String, AppError> {
        let params = self.params.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hash_with(&params, &password))
            .await
            .map_err(|e| AppError::Internal(anyhow!("hashing task failed: {e}")))?
    }

    /// Check `password` against a stored hash (constant-time comparison).
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || verify_with(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(anyhow!("verification task failed: {e}")))?
    }

    /// Burn one verification against the dummy hash; the result is discarded.
    pub async fn verify_dummy(&self, password: &str) {
        let dummy = self.dummy_hash.to_string();
        if let Err(e) = self.verify(password, &dummy).await {
            tracing::warn!(error = %e, "Dummy password verification failed");
        }
    }
}

fn hash_with(params: &Params, password: &str) -> Result<String, AppError> {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill(&mut salt[..]);
    let salt = SaltString::encode_b64(&salt)
        .map_err(|e| AppError::Internal(anyhow!("salt encoding failed: {e}")))?;

    Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone())
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow!("password hashing failed: {e}")))
}

fn verify_with(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow!("invalid stored hash: {e}")))?;

    // Parameters are read from the PHC string, so older hashes keep verifying
    // after the configured cost changes.
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::Internal(anyhow!("password verification failed: {e}"))),
    }
}

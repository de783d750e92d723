// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer token codec.
//!
//! Access and refresh tokens are HS256 JWTs signed with two different keys and
//! carrying an explicit `type` claim, so neither kind can stand in for the
//! other. Every verification failure collapses into [`AppError::InvalidToken`];
//! the precise reason is only logged.
//!
//! Also issues the opaque one-time tokens used for password reset and email
//! verification.

use crate::config::Config;
use crate::error::AppError;
use crate::models::{BranchId, Role, TenantId, UserId};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const ONE_TIME_TOKEN_BYTES: usize = 32;

/// Discriminates token kinds inside the signed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Identity carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub role: Role,
    pub email: String,
    pub branch_id: Option<BranchId>,
}

/// Access token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub role: Role,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<BranchId>,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Refresh token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshClaims {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Freshly minted access + refresh pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: DateTime<Utc>,
}

/// Issues and verifies signed bearer tokens.
#[derive(Clone)]
pub struct TokenCodec {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(
        access_secret: &[u8],
        refresh_secret: &[u8],
        issuer: &str,
        audience: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            refresh_encoding: EncodingKey::from_secret(refresh_secret),
            refresh_decoding: DecodingKey::from_secret(refresh_secret),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_access_secret,
            &config.jwt_refresh_secret,
            &config.jwt_issuer,
            &config.jwt_audience,
            config.access_token_ttl,
            config.refresh_token_ttl,
        )
    }

    /// Sign an access token for `claims`.
    pub fn issue_access_token(&self, claims: &SessionClaims) -> Result<String, AppError> {
        let now = Utc::now();
        let payload = AccessClaims {
            user_id: claims.user_id,
            tenant_id: claims.tenant_id,
            role: claims.role,
            email: claims.email.clone(),
            branch_id: claims.branch_id,
            token_type: TokenType::Access,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: expires_at(now, self.access_ttl)?.timestamp(),
        };
        sign(&payload, &self.access_encoding)
    }

    /// Sign a refresh token for a user.
    pub fn issue_refresh_token(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let payload = RefreshClaims {
            user_id,
            tenant_id,
            token_type: TokenType::Refresh,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: expires_at(now, self.refresh_ttl)?.timestamp(),
        };
        sign(&payload, &self.refresh_encoding)
    }

    /// Mint a matching access + refresh pair.
    pub fn issue_pair(&self, claims: &SessionClaims) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(claims)?,
            refresh_token: self.issue_refresh_token(claims.user_id, claims.tenant_id)?,
            access_token_expires_at: expires_at(Utc::now(), self.access_ttl)?,
        })
    }

    /// Verify an access token and return its identity claims.
    pub fn verify_access_token(&self, token: &str) -> Result<SessionClaims, AppError> {
        let claims: AccessClaims = self.verify(token, &self.access_decoding)?;
        if claims.token_type != TokenType::Access {
            tracing::debug!(token_type = ?claims.token_type, "Rejected non-access token");
            return Err(AppError::InvalidToken);
        }
        Ok(SessionClaims {
            user_id: claims.user_id,
            tenant_id: claims.tenant_id,
            role: claims.role,
            email: claims.email,
            branch_id: claims.branch_id,
        })
    }

    /// Verify a refresh token and return `(user_id, tenant_id)`.
    pub fn verify_refresh_token(&self, token: &str) -> Result<(UserId, TenantId), AppError> {
        let claims: RefreshClaims = self.verify(token, &self.refresh_decoding)?;
        if claims.token_type != TokenType::Refresh {
            tracing::debug!(token_type = ?claims.token_type, "Rejected non-refresh token");
            return Err(AppError::InvalidToken);
        }
        Ok((claims.user_id, claims.tenant_id))
    }

    fn verify<C: DeserializeOwned>(&self, token: &str, key: &DecodingKey) -> Result<C, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        decode::<C>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(reason = ?e.kind(), "Token verification failed");
                AppError::InvalidToken
            })
    }
}

fn expires_at(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, AppError> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("token lifetime {ttl} out of range")))
}

fn sign<C: Serialize>(claims: &C, key: &EncodingKey) -> Result<String, AppError> {
    encode(&Header::new(Algorithm::HS256), claims, key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT encode failed: {e}")))
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}

/// Opaque single-use token handed to a user out of band.
///
/// The raw value embeds the owning tenant so redemption is a tenant-scoped
/// lookup; only the SHA-256 digest is ever stored.
#[derive(Debug, Clone)]
pub struct OneTimeToken {
    pub raw: String,
    pub digest: String,
}

impl OneTimeToken {
    pub fn generate(tenant_id: TenantId) -> Self {
        let mut bytes = [0u8; ONE_TIME_TOKEN_BYTES];
        rand::rng().fill(&mut bytes[..]);
        let secret = URL_SAFE_NO_PAD.encode(bytes);
        let raw = format!("{tenant_id}.{secret}");
        let digest = digest(&secret);
        Self { raw, digest }
    }

    /// Split a presented token into its tenant and the digest of its secret.
    pub fn parse(raw: &str) -> Option<(TenantId, String)> {
        let (tenant, secret) = raw.trim().split_once('.')?;
        let tenant_id: TenantId = tenant.parse().ok()?;
        if secret.is_empty() {
            return None;
        }
        Some((tenant_id, digest(secret)))
    }
}

fn digest(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Constant-time comparison of a stored digest with a presented one.
pub fn digest_matches(stored: Option<&str>, presented: &str) -> bool {
    stored.is_some_and(|stored| bool::from(stored.as_bytes().ct_eq(presented.as_bytes())))
}

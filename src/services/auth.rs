// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential and session lifecycle.
//!
//! Sessions are stateless: every successful login, registration or refresh
//! mints a new access/refresh pair and nothing is recorded server-side, so a
//! previously issued refresh token stays valid until it expires.

use crate::db::Store;
use crate::error::AppError;
use crate::models::{BranchId, Role, Tenant, TenantId, User, UserId, UserProfile, UserStatus};
use crate::services::mailer::Mailer;
use crate::services::password::PasswordService;
use crate::services::token::{digest_matches, OneTimeToken, SessionClaims, TokenCodec, TokenPair};
use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Result of a successful login or registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user: UserProfile,
    pub tenant: Tenant,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Self-registration request.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    /// Requested role; only [`Role::Student`] may self-register.
    pub role: Option<Role>,
    pub tenant_domain: String,
    pub branch_id: Option<BranchId>,
}

/// Claims carried by an access token issued for `user`.
pub fn session_claims(user: &User) -> SessionClaims {
    SessionClaims {
        user_id: user.id,
        tenant_id: user.tenant_id,
        role: user.role,
        email: user.email.clone(),
        branch_id: user.branch_id,
    }
}

/// Lowercased, trimmed email used for lookups and storage.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Reject accounts whose status forbids holding a session.
///
/// Pending accounts may sign in; verification is enforced elsewhere.
pub fn ensure_can_sign_in(user: &User) -> Result<(), AppError> {
    match user.status {
        UserStatus::Active | UserStatus::Pending => Ok(()),
        UserStatus::Suspended => Err(AppError::AccountSuspended),
        UserStatus::Inactive => Err(AppError::AccountInactive),
    }
}

#[derive(Clone)]
pub struct AuthService {
    store: Store,
    tokens: TokenCodec,
    passwords: PasswordService,
    mailer: Arc<dyn Mailer>,
    reset_ttl: Duration,
}

impl AuthService {
    pub fn new(
        store: Store,
        tokens: TokenCodec,
        passwords: PasswordService,
        mailer: Arc<dyn Mailer>,
        reset_ttl: Duration,
    ) -> Self {
        Self {
            store,
            tokens,
            passwords,
            mailer,
            reset_ttl,
        }
    }

    /// Resolve an active tenant from its login domain.
    async fn resolve_tenant(&self, domain: &str) -> Result<Tenant, AppError> {
        match self.store.tenants.find_by_domain(domain).await? {
            Some(tenant) if tenant.active => Ok(tenant),
            Some(tenant) => {
                tracing::warn!(tenant_id = %tenant.id, "Tenant is inactive");
                Err(AppError::InvalidTenant)
            }
            None => {
                tracing::warn!(tenant_domain = %domain, "Unknown tenant domain");
                Err(AppError::InvalidTenant)
            }
        }
    }

    /// Authenticate `email`/`password` inside the tenant named by `tenant_domain`.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        tenant_domain: &str,
    ) -> Result<AuthSession, AppError> {
        let tenant = self.resolve_tenant(tenant_domain).await?;
        if tenant.license_expired(Utc::now()) {
            tracing::warn!(tenant_id = %tenant.id, license_end = %tenant.license_end, "Login refused: license expired");
            return Err(AppError::LicenseExpired);
        }

        let email = normalize_email(email);
        let Some(user) = self.store.users.find_by_email(tenant.id, &email).await? else {
            self.passwords.verify_dummy(password).await;
            tracing::warn!(tenant_id = %tenant.id, reason = "unknown email", "Login failed");
            return Err(AppError::InvalidCredentials);
        };

        if !self.passwords.verify(password, &user.password_hash).await? {
            tracing::warn!(tenant_id = %tenant.id, user_id = %user.id, reason = "password mismatch", "Login failed");
            return Err(AppError::InvalidCredentials);
        }

        if let Err(e) = ensure_can_sign_in(&user) {
            tracing::warn!(tenant_id = %tenant.id, user_id = %user.id, status = user.status.as_str(), "Login refused");
            return Err(e);
        }

        self.record_login(user.id, tenant.id);

        let tokens = self.tokens.issue_pair(&session_claims(&user))?;
        tracing::info!(tenant_id = %tenant.id, user_id = %user.id, role = %user.role, "User logged in");

        Ok(AuthSession {
            user: user.into(),
            tenant,
            tokens,
        })
    }

    /// Stamp the last-login time without holding up the response.
    fn record_login(&self, user_id: UserId, tenant_id: TenantId) {
        let users = self.store.users.clone();
        tokio::spawn(async move {
            let now = Utc::now();
            if let Err(e) = users
                .update_with(user_id, tenant_id, |user| user.last_login_at = Some(now))
                .await
            {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to record last login");
            }
        });
    }

    /// Create a pending student account and sign it in.
    pub async fn register(&self, registration: Registration) -> Result<AuthSession, AppError> {
        let tenant = self.resolve_tenant(&registration.tenant_domain).await?;

        let role = registration.role.unwrap_or(Role::Student);
        if role != Role::Student {
            tracing::warn!(tenant_id = %tenant.id, requested_role = %role, "Self-registration with elevated role refused");
            return Err(AppError::Forbidden);
        }

        if let Some(branch_id) = registration.branch_id {
            if self
                .store
                .branches
                .find_by_id(branch_id, tenant.id)
                .await?
                .is_none()
            {
                return Err(AppError::BadRequest("Unknown branch".to_string()));
            }
        }

        let password_hash = self.passwords.hash(&registration.password).await?;
        let verification = OneTimeToken::generate(tenant.id);
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            tenant_id: tenant.id,
            email: normalize_email(&registration.email),
            password_hash,
            first_name: registration.first_name.trim().to_string(),
            last_name: registration.last_name.trim().to_string(),
            phone: registration.phone,
            role,
            status: UserStatus::Pending,
            branch_id: registration.branch_id,
            email_verified: false,
            email_verification_token: Some(verification.digest),
            password_reset_token: None,
            password_reset_expires: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };

        let user = self.store.users.create(user).await.map_err(|e| match e {
            AppError::Conflict(_) => AppError::DuplicateUser,
            other => other,
        })?;
        self.store.tenants.adjust_user_count(tenant.id, 1).await?;
        self.mailer
            .send_email_verification(&user.email, &verification.raw);

        let tokens = self.tokens.issue_pair(&session_claims(&user))?;
        tracing::info!(tenant_id = %tenant.id, user_id = %user.id, "User registered");

        let tenant = self
            .store
            .tenants
            .find_by_id(tenant.id, tenant.id)
            .await?
            .unwrap_or(tenant);

        Ok(AuthSession {
            user: user.into(),
            tenant,
            tokens,
        })
    }

    /// Exchange a refresh token for a fresh pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let (user_id, tenant_id) = self.tokens.verify_refresh_token(refresh_token)?;

        let tenant = match self.store.tenants.find_by_id(tenant_id, tenant_id).await? {
            Some(tenant) if tenant.active => tenant,
            _ => {
                tracing::warn!(tenant_id = %tenant_id, "Refresh refused: tenant missing or inactive");
                return Err(AppError::InvalidTenant);
            }
        };
        if tenant.license_expired(Utc::now()) {
            tracing::warn!(tenant_id = %tenant_id, license_end = %tenant.license_end, "Refresh refused: license expired");
            return Err(AppError::LicenseExpired);
        }

        let Some(user) = self.store.users.find_by_id(user_id, tenant_id).await? else {
            tracing::warn!(user_id = %user_id, "Refresh refused: user no longer exists");
            return Err(AppError::InvalidToken);
        };
        ensure_can_sign_in(&user)?;

        self.tokens.issue_pair(&session_claims(&user))
    }

    /// Profile of the signed-in user.
    pub async fn profile(&self, user_id: UserId, tenant_id: TenantId) -> Result<UserProfile, AppError> {
        self.store
            .users
            .find_by_id(user_id, tenant_id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Replace the password after checking the current one.
    pub async fn change_password(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self
            .store
            .users
            .find_by_id(user_id, tenant_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        if !self.passwords.verify(current_password, &user.password_hash).await? {
            tracing::warn!(user_id = %user_id, "Password change refused: current password mismatch");
            return Err(AppError::BadRequest(
                "Current password is incorrect".to_string(),
            ));
        }

        let password_hash = self.passwords.hash(new_password).await?;
        self.store
            .users
            .update_with(user_id, tenant_id, |user| user.password_hash = password_hash)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Issue a reset token if the account exists; succeeds silently otherwise.
    pub async fn request_password_reset(
        &self,
        email: &str,
        tenant_domain: &str,
    ) -> Result<(), AppError> {
        let Ok(tenant) = self.resolve_tenant(tenant_domain).await else {
            return Ok(());
        };
        let email = normalize_email(email);
        let Some(user) = self.store.users.find_by_email(tenant.id, &email).await? else {
            tracing::debug!(tenant_id = %tenant.id, "Password reset requested for unknown email");
            return Ok(());
        };

        let token = OneTimeToken::generate(tenant.id);
        let expires = Utc::now() + self.reset_ttl;
        let digest = token.digest.clone();
        self.store
            .users
            .update_with(user.id, tenant.id, |user| {
                user.password_reset_token = Some(digest);
                user.password_reset_expires = Some(expires);
            })
            .await?;

        self.mailer.send_password_reset(&user.email, &token.raw);
        tracing::info!(tenant_id = %tenant.id, user_id = %user.id, "Password reset issued");
        Ok(())
    }

    /// Redeem a reset token and set a new password.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        let (tenant_id, digest) = OneTimeToken::parse(token).ok_or(AppError::InvalidOneTimeToken)?;
        let now = Utc::now();

        let user = self
            .store
            .users
            .find_one(tenant_id, |user| {
                digest_matches(user.password_reset_token.as_deref(), &digest)
            })
            .await?
            .ok_or(AppError::InvalidOneTimeToken)?;
        if !user.password_reset_expires.is_some_and(|expires| expires >= now) {
            tracing::debug!(user_id = %user.id, "Password reset token expired");
            return Err(AppError::InvalidOneTimeToken);
        }

        let password_hash = self.passwords.hash(new_password).await?;

        // Re-check under the row lock so a token is only ever redeemed once.
        let mut redeemed = false;
        self.store
            .users
            .update_if(user.id, tenant_id, |user| {
                redeemed = digest_matches(user.password_reset_token.as_deref(), &digest)
                    && user.password_reset_expires.is_some_and(|expires| expires >= now);
                if redeemed {
                    user.password_hash = password_hash;
                    user.password_reset_token = None;
                    user.password_reset_expires = None;
                }
                redeemed
            })
            .await?;
        if !redeemed {
            return Err(AppError::InvalidOneTimeToken);
        }

        tracing::info!(tenant_id = %tenant_id, user_id = %user.id, "Password reset completed");
        Ok(())
    }

    /// Redeem an email verification token, activating a pending account.
    pub async fn verify_email(&self, token: &str) -> Result<UserProfile, AppError> {
        let (tenant_id, digest) = OneTimeToken::parse(token).ok_or(AppError::InvalidOneTimeToken)?;

        let user = self
            .store
            .users
            .find_one(tenant_id, |user| {
                digest_matches(user.email_verification_token.as_deref(), &digest)
            })
            .await?
            .ok_or(AppError::InvalidOneTimeToken)?;

        let mut redeemed = false;
        let updated = self
            .store
            .users
            .update_if(user.id, tenant_id, |user| {
                redeemed = digest_matches(user.email_verification_token.as_deref(), &digest);
                if redeemed {
                    user.email_verified = true;
                    user.email_verification_token = None;
                    if user.status == UserStatus::Pending {
                        user.status = UserStatus::Active;
                    }
                }
                redeemed
            })
            .await?;

        match updated {
            Some(user) if redeemed => {
                tracing::info!(tenant_id = %tenant_id, user_id = %user.id, "Email verified");
                Ok(user.into())
            }
            _ => Err(AppError::InvalidOneTimeToken),
        }
    }

    /// Send a fresh verification token to an unverified account.
    ///
    /// Unknown and already-verified addresses succeed silently.
    pub async fn resend_verification(
        &self,
        email: &str,
        tenant_domain: &str,
    ) -> Result<(), AppError> {
        let Ok(tenant) = self.resolve_tenant(tenant_domain).await else {
            return Ok(());
        };
        let email = normalize_email(email);
        let Some(user) = self.store.users.find_by_email(tenant.id, &email).await? else {
            return Ok(());
        };
        if user.email_verified {
            return Ok(());
        }

        let token = OneTimeToken::generate(tenant.id);
        let digest = token.digest.clone();
        self.store
            .users
            .update_with(user.id, tenant.id, |user| {
                user.email_verification_token = Some(digest);
            })
            .await?;

        self.mailer.send_email_verification(&user.email, &token.raw);
        tracing::info!(tenant_id = %tenant.id, user_id = %user.id, "Verification email re-sent");
        Ok(())
    }
}

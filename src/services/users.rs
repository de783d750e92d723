// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Staff-side user management.

use crate::authz::{require_branch, require_role, AccessCheck};
use crate::db::{Filters, Page, Pagination, Store};
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::{BranchId, Role, User, UserId, UserPatch, UserProfile, UserStatus};
use crate::services::auth::normalize_email;
use crate::services::mailer::Mailer;
use crate::services::password::PasswordService;
use crate::services::token::OneTimeToken;
use chrono::Utc;
use std::sync::Arc;

/// Account created by staff.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub status: Option<UserStatus>,
    pub branch_id: Option<BranchId>,
}

#[derive(Clone)]
pub struct UserService {
    store: Store,
    passwords: PasswordService,
    mailer: Arc<dyn Mailer>,
}

impl UserService {
    pub fn new(store: Store, passwords: PasswordService, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            store,
            passwords,
            mailer,
        }
    }

    /// List users of the caller's tenant. Staff only.
    pub async fn list(
        &self,
        caller: &AuthUser,
        pagination: &Pagination,
        filters: &Filters,
    ) -> Result<Page<UserProfile>, AppError> {
        AccessCheck::new(caller)
            .role(Role::Coach)
            .branch(filters.branch_id)
            .check()?;

        let page = self
            .store
            .users
            .find_all(caller.tenant_id, pagination, filters)
            .await?;
        Ok(Page {
            items: page.items.iter().map(UserProfile::from).collect(),
            total: page.total,
        })
    }

    /// Fetch one user. Students may only fetch themselves.
    pub async fn get(&self, caller: &AuthUser, id: UserId) -> Result<UserProfile, AppError> {
        AccessCheck::new(caller).user(id).check()?;
        self.find(caller, id).await.map(UserProfile::from)
    }

    async fn find(&self, caller: &AuthUser, id: UserId) -> Result<User, AppError> {
        self.store
            .users
            .find_by_id(id, caller.tenant_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    async fn ensure_branch_exists(
        &self,
        caller: &AuthUser,
        branch_id: Option<BranchId>,
    ) -> Result<(), AppError> {
        if let Some(branch_id) = branch_id {
            if self
                .store
                .branches
                .find_by_id(branch_id, caller.tenant_id)
                .await?
                .is_none()
            {
                return Err(AppError::BadRequest("Unknown branch".to_string()));
            }
        }
        Ok(())
    }

    /// Create an account in the caller's tenant.
    ///
    /// Requires branch manager or above; the new role may not outrank the
    /// caller's.
    pub async fn create(&self, caller: &AuthUser, new_user: NewUser) -> Result<UserProfile, AppError> {
        AccessCheck::new(caller)
            .role(Role::BranchManager)
            .branch(new_user.branch_id)
            .check()?;
        require_role(caller, new_user.role)?;
        self.ensure_branch_exists(caller, new_user.branch_id).await?;

        let password_hash = self.passwords.hash(&new_user.password).await?;
        let verification = OneTimeToken::generate(caller.tenant_id);
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            tenant_id: caller.tenant_id,
            email: normalize_email(&new_user.email),
            password_hash,
            first_name: new_user.first_name.trim().to_string(),
            last_name: new_user.last_name.trim().to_string(),
            phone: new_user.phone,
            role: new_user.role,
            status: new_user.status.unwrap_or(UserStatus::Active),
            branch_id: new_user.branch_id,
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
        self.store
            .tenants
            .adjust_user_count(caller.tenant_id, 1)
            .await?;
        self.mailer
            .send_email_verification(&user.email, &verification.raw);

        tracing::info!(
            tenant_id = %caller.tenant_id,
            user_id = %user.id,
            created_by = %caller.user_id,
            role = %user.role,
            "User created"
        );
        Ok(user.into())
    }

    /// Update a user.
    ///
    /// Anyone may edit their own profile fields. Editing someone else, or
    /// touching role, status or branch, needs branch manager or above, and
    /// never lets the caller act on or grant a role above their own.
    pub async fn update(
        &self,
        caller: &AuthUser,
        id: UserId,
        patch: UserPatch,
    ) -> Result<UserProfile, AppError> {
        let editing_self = caller.user_id == id;
        if !editing_self || patch.is_administrative() {
            require_role(caller, Role::BranchManager)?;
        }

        let target = self.find(caller, id).await?;
        if !editing_self {
            require_role(caller, target.role)?;
            require_branch(caller, target.branch_id)?;
        }
        if let Some(role) = patch.role {
            require_role(caller, role)?;
        }
        if let Some(branch_id) = patch.branch_id.flatten() {
            require_branch(caller, Some(branch_id))?;
            self.ensure_branch_exists(caller, Some(branch_id)).await?;
        }

        let updated = self
            .store
            .users
            .update(id, caller.tenant_id, patch)
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => AppError::DuplicateUser,
                other => other,
            })?
            .ok_or_else(|| AppError::not_found("User"))?;

        tracing::info!(tenant_id = %caller.tenant_id, user_id = %id, updated_by = %caller.user_id, "User updated");
        Ok(updated.into())
    }

    /// Delete a user. Branch manager or above; never oneself.
    pub async fn delete(&self, caller: &AuthUser, id: UserId) -> Result<(), AppError> {
        require_role(caller, Role::BranchManager)?;
        if caller.user_id == id {
            return Err(AppError::BadRequest(
                "Cannot delete your own account".to_string(),
            ));
        }

        let target = self.find(caller, id).await?;
        require_role(caller, target.role)?;
        require_branch(caller, target.branch_id)?;

        if !self.store.users.delete(id, caller.tenant_id).await? {
            return Err(AppError::not_found("User"));
        }
        self.store
            .tenants
            .adjust_user_count(caller.tenant_id, -1)
            .await?;

        tracing::info!(tenant_id = %caller.tenant_id, user_id = %id, deleted_by = %caller.user_id, "User deleted");
        Ok(())
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authorization gates.
//!
//! Four independent checks, each a pure function of the caller's verified
//! claims and the target resource's identifiers:
//!
//! - **role**: the caller's rank must reach the required minimum;
//! - **tenant**: the resource must belong to the caller's tenant;
//! - **branch**: branch-bound staff may only touch their own branch;
//! - **self**: students may only act on their own user record.
//!
//! Gates are conjunctive. [`AccessCheck`] always evaluates the tenant gate
//! first so later denials cannot reveal anything about another tenant.

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::{BranchId, Role, TenantId, UserId};

/// Deny unless `caller.role` ranks at least `min`.
pub fn require_role(caller: &AuthUser, min: Role) -> Result<(), AppError> {
    if caller.role.at_least(min) {
        Ok(())
    } else {
        deny(caller, "role")
    }
}

/// Deny if a resource tenant is given and differs from the caller's.
pub fn require_tenant(caller: &AuthUser, tenant_id: Option<TenantId>) -> Result<(), AppError> {
    match tenant_id {
        Some(tenant_id) if tenant_id != caller.tenant_id => deny(caller, "tenant"),
        _ => Ok(()),
    }
}

/// Branch gate: system managers pass, branch managers and coaches pass only
/// for their own branch, students are governed by the self gate instead.
pub fn require_branch(caller: &AuthUser, branch_id: Option<BranchId>) -> Result<(), AppError> {
    let Some(branch_id) = branch_id else {
        return Ok(());
    };
    match caller.role {
        Role::SystemManager | Role::Student => Ok(()),
        Role::BranchManager | Role::Coach if caller.branch_id == Some(branch_id) => Ok(()),
        Role::BranchManager | Role::Coach => deny(caller, "branch"),
    }
}

/// Self gate: staff pass, students only for their own record.
pub fn require_self(caller: &AuthUser, target: UserId) -> Result<(), AppError> {
    match caller.role {
        Role::SystemManager | Role::BranchManager | Role::Coach => Ok(()),
        Role::Student if caller.user_id == target => Ok(()),
        Role::Student => deny(caller, "self"),
    }
}

fn deny(caller: &AuthUser, gate: &'static str) -> Result<(), AppError> {
    tracing::debug!(
        user_id = %caller.user_id,
        tenant_id = %caller.tenant_id,
        role = %caller.role,
        gate,
        "Access denied"
    );
    Err(AppError::Forbidden)
}

/// The set of gates a route applies, evaluated tenant-first.
///
/// ```ignore
/// AccessCheck::new(&caller)
///     .role(Role::Coach)
///     .branch(class.branch_id)
///     .check()?;
/// ```
#[derive(Debug, Clone)]
pub struct AccessCheck<'a> {
    caller: &'a AuthUser,
    tenant_id: Option<TenantId>,
    min_role: Option<Role>,
    branch_id: Option<BranchId>,
    target_user: Option<UserId>,
}

impl<'a> AccessCheck<'a> {
    pub fn new(caller: &'a AuthUser) -> Self {
        Self {
            caller,
            tenant_id: None,
            min_role: None,
            branch_id: None,
            target_user: None,
        }
    }

    pub fn tenant(mut self, tenant_id: impl Into<Option<TenantId>>) -> Self {
        self.tenant_id = tenant_id.into();
        self
    }

    pub fn role(mut self, min: Role) -> Self {
        self.min_role = Some(min);
        self
    }

    pub fn branch(mut self, branch_id: impl Into<Option<BranchId>>) -> Self {
        self.branch_id = branch_id.into();
        self
    }

    pub fn user(mut self, target: UserId) -> Self {
        self.target_user = Some(target);
        self
    }

    pub fn check(self) -> Result<(), AppError> {
        require_tenant(self.caller, self.tenant_id)?;
        if let Some(min) = self.min_role {
            require_role(self.caller, min)?;
        }
        require_branch(self.caller, self.branch_id)?;
        if let Some(target) = self.target_user {
            require_self(self.caller, target)?;
        }
        Ok(())
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model, role hierarchy, and account status.

use crate::db::repository::{SortKey, TenantScoped};
use crate::models::{BranchId, TenantId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Role of a user within its tenant.
///
/// Roles form a strict total order; see [`Role::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Coach,
    BranchManager,
    SystemManager,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Student,
        Role::Coach,
        Role::BranchManager,
        Role::SystemManager,
    ];

    /// Position in the hierarchy, lowest first.
    pub fn rank(self) -> u8 {
        match self {
            Role::Student => 1,
            Role::Coach => 2,
            Role::BranchManager => 3,
            Role::SystemManager => 4,
        }
    }

    /// True when this role satisfies a gate requiring `min`.
    pub fn at_least(self, min: Role) -> bool {
        self.rank() >= min.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Coach => "coach",
            Role::BranchManager => "branch_manager",
            Role::SystemManager => "system_manager",
        }
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account status; drives login eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
    #[default]
    Pending,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Suspended => "suspended",
            UserStatus::Pending => "pending",
        }
    }
}

/// Stored user record. Never serialized directly to clients; see [`UserProfile`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub tenant_id: TenantId,
    /// Stored lowercase; unique per tenant.
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub status: UserStatus,
    pub branch_id: Option<BranchId>,
    pub email_verified: bool,
    /// SHA-256 digest of the outstanding verification token.
    pub email_verification_token: Option<String>,
    /// SHA-256 digest of the outstanding reset token.
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-facing view of a user (no hash, no outstanding tokens).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub status: UserStatus,
    pub branch_id: Option<BranchId>,
    pub email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            tenant_id: user.tenant_id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            role: user.role,
            status: user.status,
            branch_id: user.branch_id,
            email_verified: user.email_verified,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

/// Partial update of a user's profile and administrative fields.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    /// `Some(None)` detaches the user from its branch.
    pub branch_id: Option<Option<BranchId>>,
}

impl UserPatch {
    /// Whether the patch touches fields only staff may change.
    pub fn is_administrative(&self) -> bool {
        self.role.is_some() || self.status.is_some() || self.branch_id.is_some()
    }
}

impl TenantScoped for User {
    type Id = UserId;
    type Patch = UserPatch;

    const TABLE: &'static str = crate::db::collections::USERS;

    fn id(&self) -> UserId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.first_name, &self.last_name, &self.email]
    }

    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }

    fn branch_id(&self) -> Option<BranchId> {
        self.branch_id
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "email" => Some(SortKey::text(&self.email)),
            "firstName" | "first_name" => Some(SortKey::text(&self.first_name)),
            "lastName" | "last_name" => Some(SortKey::text(&self.last_name)),
            "role" => Some(SortKey::Number(i64::from(self.role.rank()))),
            "status" => Some(SortKey::text(self.status.as_str())),
            "lastLoginAt" | "last_login_at" => self.last_login_at.map(SortKey::Time),
            _ => None,
        }
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.email.to_lowercase())
    }

    fn apply_patch(&mut self, patch: UserPatch) {
        if let Some(email) = patch.email {
            self.email = email.to_lowercase();
        }
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
        if let Some(phone) = patch.phone {
            self.phone = Some(phone);
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(branch_id) = patch.branch_id {
            self.branch_id = branch_id;
        }
    }
}

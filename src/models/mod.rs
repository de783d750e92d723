// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod branch;
pub mod class;
pub mod ids;
pub mod tenant;
pub mod user;

pub use branch::{Address, Branch, BranchPatch};
pub use class::{ClassLevel, ClassPatch, TrainingClass};
pub use ids::{BranchId, ClassId, TenantId, UserId};
pub use tenant::{SubscriptionPlan, Tenant, TenantPatch};
pub use user::{Role, User, UserPatch, UserProfile, UserStatus};

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage layer: tenant-scoped repositories behind an explicit store handle.

pub mod repository;
pub mod store;

pub use repository::{Filters, Page, Pagination, Repository, SortOrder, TenantScoped};
pub use store::Store;

/// Collection names as constants.
pub mod collections {
    pub const TENANTS: &str = "tenants";
    pub const USERS: &str = "users";
    pub const BRANCHES: &str = "branches";
    pub const CLASSES: &str = "classes";
}

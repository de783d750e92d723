// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Branch (academy location) model.

use crate::db::repository::{SortKey, TenantScoped};
use crate::models::{BranchId, TenantId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Postal address of a branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: BranchId,
    pub tenant_id: TenantId,
    pub name: String,
    pub address: Address,
    pub capacity: u32,
    pub manager_id: Option<UserId>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchPatch {
    pub name: Option<String>,
    pub address: Option<Address>,
    pub capacity: Option<u32>,
    pub manager_id: Option<UserId>,
    pub active: Option<bool>,
}

impl TenantScoped for Branch {
    type Id = BranchId;
    type Patch = BranchPatch;

    const TABLE: &'static str = crate::db::collections::BRANCHES;

    fn id(&self) -> BranchId {
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
        let mut fields = vec![self.name.as_str()];
        if let Some(city) = &self.address.city {
            fields.push(city);
        }
        fields
    }

    fn status_label(&self) -> &'static str {
        if self.active {
            "active"
        } else {
            "inactive"
        }
    }

    /// A branch scopes itself for branch-gate purposes.
    fn branch_id(&self) -> Option<BranchId> {
        Some(self.id)
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "name" => Some(SortKey::text(&self.name)),
            "capacity" => Some(SortKey::Number(i64::from(self.capacity))),
            "city" => self.address.city.as_deref().map(SortKey::text),
            _ => None,
        }
    }

    fn apply_patch(&mut self, patch: BranchPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
        if let Some(capacity) = patch.capacity {
            self.capacity = capacity;
        }
        if let Some(manager_id) = patch.manager_id {
            self.manager_id = Some(manager_id);
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
    }
}

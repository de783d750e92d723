// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tenant (academy organization) model.

use crate::db::repository::{SortKey, TenantScoped, UniqueScope};
use crate::error::AppError;
use crate::models::TenantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Longest DNS name we accept as a tenant domain.
const MAX_DOMAIN_LEN: usize = 253;
const MIN_DOMAIN_LEN: usize = 3;

/// Subscription plan of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    #[default]
    Trial,
    Basic,
    Professional,
    Enterprise,
}

/// An isolated organization. Every other record is partitioned by its id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    /// Login namespace; globally unique, stored lowercase.
    pub domain: String,
    pub plan: SubscriptionPlan,
    pub license_start: DateTime<Utc>,
    pub license_end: DateTime<Utc>,
    pub active: bool,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub settings: HashMap<String, serde_json::Value>,
    /// Number of users currently registered under this tenant.
    pub current_users: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Whether the license window has already closed at `now`.
    pub fn license_expired(&self, now: DateTime<Utc>) -> bool {
        self.license_end < now
    }
}

/// Partial update of tenant profile fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantPatch {
    pub name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub settings: Option<HashMap<String, serde_json::Value>>,
    pub plan: Option<SubscriptionPlan>,
    pub license_end: Option<DateTime<Utc>>,
    pub active: Option<bool>,
}

impl TenantScoped for Tenant {
    type Id = TenantId;
    type Patch = TenantPatch;

    const TABLE: &'static str = crate::db::collections::TENANTS;
    const UNIQUE_SCOPE: UniqueScope = UniqueScope::Global;

    fn id(&self) -> TenantId {
        self.id
    }

    /// A tenant is its own scope.
    fn tenant_id(&self) -> TenantId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.domain]
    }

    fn status_label(&self) -> &'static str {
        if self.active {
            "active"
        } else {
            "inactive"
        }
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "name" => Some(SortKey::text(&self.name)),
            "domain" => Some(SortKey::text(&self.domain)),
            "licenseEnd" | "license_end" => Some(SortKey::Time(self.license_end)),
            _ => None,
        }
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.domain.to_lowercase())
    }

    fn apply_patch(&mut self, patch: TenantPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.contact_email {
            self.contact_email = Some(email);
        }
        if let Some(phone) = patch.contact_phone {
            self.contact_phone = Some(phone);
        }
        if let Some(settings) = patch.settings {
            self.settings = settings;
        }
        if let Some(plan) = patch.plan {
            self.plan = plan;
        }
        if let Some(end) = patch.license_end {
            self.license_end = end;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
    }
}

/// Validate and normalise a tenant login domain (e.g. `demo.jiu-jitsu.com`).
pub fn normalize_domain(raw: &str) -> Result<String, AppError> {
    let domain = raw.trim().to_lowercase();
    let invalid = || AppError::BadRequest(format!("Invalid tenant domain: {raw}"));

    if domain.len() < MIN_DOMAIN_LEN || domain.len() > MAX_DOMAIN_LEN || !domain.contains('.') {
        return Err(invalid());
    }

    let allowed = domain
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-');
    if !allowed {
        return Err(invalid());
    }

    let bad_edge = |label: &str| {
        label.is_empty() || label.starts_with('-') || label.ends_with('-')
    };
    if domain.split('.').any(bad_edge) {
        return Err(invalid());
    }

    Ok(domain)
}

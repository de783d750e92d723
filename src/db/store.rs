// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory credential and roster store.
//!
//! The store is an explicit handle owned by the process entry point (or by a
//! test); there is no module-level state. Clones share the same tables.

use crate::db::repository::Repository;
use crate::error::AppError;
use crate::models::{Branch, Tenant, TenantId, TrainingClass, User};

#[derive(Clone, Default)]
pub struct Store {
    pub tenants: Repository<Tenant>,
    pub users: Repository<User>,
    pub branches: Repository<Branch>,
    pub classes: Repository<TrainingClass>,
}

impl Store {
    /// Create an empty store.
    pub fn init() -> Self {
        tracing::info!("Initialized in-memory store");
        Self::default()
    }

    /// Drop all data held by the store.
    pub fn teardown(&self) {
        self.classes.clear();
        self.branches.clear();
        self.users.clear();
        self.tenants.clear();
        tracing::info!("Store torn down");
    }
}

impl Repository<Tenant> {
    /// Resolve a login namespace to its tenant.
    pub async fn find_by_domain(&self, domain: &str) -> Result<Option<Tenant>, AppError> {
        Ok(self.find_by_global_key(domain.trim()))
    }

    /// Add `delta` to the tenant's user counter, saturating at zero.
    pub async fn adjust_user_count(&self, tenant_id: TenantId, delta: i32) -> Result<(), AppError> {
        self.update_with(tenant_id, tenant_id, |tenant| {
            tenant.current_users = tenant.current_users.saturating_add_signed(delta);
        })
        .await?;
        Ok(())
    }
}

impl Repository<User> {
    /// Look up a user by email within one tenant.
    pub async fn find_by_email(
        &self,
        tenant_id: TenantId,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        self.find_by_unique_key(tenant_id, email.trim()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubscriptionPlan;
    use chrono::{Duration, Utc};

    fn tenant(domain: &str) -> Tenant {
        let now = Utc::now();
        Tenant {
            id: TenantId::new(),
            name: domain.to_string(),
            domain: domain.to_string(),
            plan: SubscriptionPlan::Trial,
            license_start: now,
            license_end: now + Duration::days(30),
            active: true,
            contact_email: None,
            contact_phone: None,
            settings: Default::default(),
            current_users: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_domain_is_globally_unique() {
        let store = Store::init();
        store.tenants.create(tenant("demo.academy.com")).await.unwrap();

        let err = store
            .tenants
            .create(tenant("DEMO.academy.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_find_by_domain_and_teardown() {
        let store = Store::init();
        let created = store.tenants.create(tenant("demo.academy.com")).await.unwrap();

        let found = store.tenants.find_by_domain("demo.academy.com").await.unwrap();
        assert_eq!(found.map(|t| t.id), Some(created.id));

        store.teardown();
        assert!(store
            .tenants
            .find_by_domain("demo.academy.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_user_counter_saturates() {
        let store = Store::init();
        let created = store.tenants.create(tenant("demo.academy.com")).await.unwrap();

        store.tenants.adjust_user_count(created.id, 2).await.unwrap();
        store.tenants.adjust_user_count(created.id, -5).await.unwrap();

        let stored = store
            .tenants
            .find_by_id(created.id, created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.current_users, 0);

        // Unknown tenant is a silent no-op.
        store.tenants.adjust_user_count(TenantId::new(), 1).await.unwrap();
    }
}

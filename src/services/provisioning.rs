// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tenant provisioning: a new tenant plus its first system manager.

use crate::config::BootstrapConfig;
use crate::db::Store;
use crate::error::AppError;
use crate::models::tenant::normalize_domain;
use crate::models::{
    Role, SubscriptionPlan, Tenant, TenantId, User, UserId, UserProfile, UserStatus,
};
use crate::services::auth::normalize_email;
use crate::services::password::PasswordService;
use chrono::{DateTime, Duration, Utc};

/// License length granted when none is given.
const DEFAULT_LICENSE_DAYS: i64 = 365;

#[derive(Debug, Clone)]
pub struct TenantProvisioning {
    pub name: String,
    pub domain: String,
    pub plan: SubscriptionPlan,
    pub license_end: Option<DateTime<Utc>>,
    pub admin_email: String,
    pub admin_password: String,
    pub admin_first_name: String,
    pub admin_last_name: String,
}

impl From<&BootstrapConfig> for TenantProvisioning {
    fn from(bootstrap: &BootstrapConfig) -> Self {
        Self {
            name: bootstrap.tenant_name.clone(),
            domain: bootstrap.tenant_domain.clone(),
            plan: SubscriptionPlan::Enterprise,
            license_end: None,
            admin_email: bootstrap.admin_email.clone(),
            admin_password: bootstrap.admin_password.clone(),
            admin_first_name: "System".to_string(),
            admin_last_name: "Administrator".to_string(),
        }
    }
}

/// Create a tenant and its first (active, verified) system manager.
///
/// The domain must be free. If the administrator cannot be created the
/// tenant is removed again.
pub async fn provision_tenant(
    store: &Store,
    passwords: &PasswordService,
    request: TenantProvisioning,
) -> Result<(Tenant, UserProfile), AppError> {
    let domain = normalize_domain(&request.domain)?;
    let now = Utc::now();

    let tenant = store
        .tenants
        .create(Tenant {
            id: TenantId::new(),
            name: request.name.trim().to_string(),
            domain,
            plan: request.plan,
            license_start: now,
            license_end: request
                .license_end
                .unwrap_or(now + Duration::days(DEFAULT_LICENSE_DAYS)),
            active: true,
            contact_email: Some(normalize_email(&request.admin_email)),
            contact_phone: None,
            settings: Default::default(),
            current_users: 0,
            created_at: now,
            updated_at: now,
        })
        .await?;

    let admin = match create_admin(store, passwords, &tenant, &request).await {
        Ok(admin) => admin,
        Err(e) => {
            store.tenants.delete(tenant.id, tenant.id).await?;
            return Err(e);
        }
    };
    store.tenants.adjust_user_count(tenant.id, 1).await?;

    let tenant = store
        .tenants
        .find_by_id(tenant.id, tenant.id)
        .await?
        .unwrap_or(tenant);

    tracing::info!(
        tenant_id = %tenant.id,
        domain = %tenant.domain,
        admin_id = %admin.id,
        "Tenant provisioned"
    );
    Ok((tenant, admin.into()))
}

async fn create_admin(
    store: &Store,
    passwords: &PasswordService,
    tenant: &Tenant,
    request: &TenantProvisioning,
) -> Result<User, AppError> {
    let password_hash = passwords.hash(&request.admin_password).await?;
    let now = Utc::now();
    store
        .users
        .create(User {
            id: UserId::new(),
            tenant_id: tenant.id,
            email: normalize_email(&request.admin_email),
            password_hash,
            first_name: request.admin_first_name.clone(),
            last_name: request.admin_last_name.clone(),
            phone: None,
            role: Role::SystemManager,
            status: UserStatus::Active,
            branch_id: None,
            email_verified: true,
            email_verification_token: None,
            password_reset_token: None,
            password_reset_expires: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        })
        .await
}

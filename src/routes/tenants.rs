// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tenant profile routes.

use crate::authz::AccessCheck;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Role, Tenant, TenantId, TenantPatch};
use crate::routes::{ApiResponse, ValidatedJson, ValidatedPath};
use crate::AppState;
use axum::{
    extract::State,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/tenants/{id}", get(get_tenant).put(update_tenant))
}

async fn get_tenant(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedPath(id): ValidatedPath<TenantId>,
) -> Result<Json<ApiResponse<Tenant>>> {
    AccessCheck::new(&user).tenant(id).check()?;

    let tenant = state
        .store
        .tenants
        .find_by_id(id, user.tenant_id)
        .await?
        .ok_or_else(|| AppError::not_found("Tenant"))?;
    Ok(ApiResponse::ok(tenant))
}

/// Fields a tenant's own system manager may change. Plan, license and
/// activation are managed at provisioning time.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTenantRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[validate(length(max = 32))]
    pub contact_phone: Option<String>,
    pub settings: Option<HashMap<String, serde_json::Value>>,
}

async fn update_tenant(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedPath(id): ValidatedPath<TenantId>,
    ValidatedJson(body): ValidatedJson<UpdateTenantRequest>,
) -> Result<Json<ApiResponse<Tenant>>> {
    AccessCheck::new(&user)
        .tenant(id)
        .role(Role::SystemManager)
        .check()?;

    let patch = TenantPatch {
        name: body.name.map(|name| name.trim().to_string()),
        contact_email: body.contact_email,
        contact_phone: body.contact_phone,
        settings: body.settings,
        ..TenantPatch::default()
    };
    let tenant = state
        .store
        .tenants
        .update(id, user.tenant_id, patch)
        .await?
        .ok_or_else(|| AppError::not_found("Tenant"))?;

    tracing::info!(tenant_id = %id, updated_by = %user.user_id, "Tenant updated");
    Ok(ApiResponse::ok(tenant))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Branch (academy location) routes.

use crate::authz::AccessCheck;
use crate::db::Filters;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Address, Branch, BranchId, BranchPatch, Role, UserId};
use crate::routes::{
    ApiResponse, ListQuery, Message, ValidatedJson, ValidatedPath, ValidatedQuery,
};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/branches", get(list_branches).post(create_branch))
        .route(
            "/branches/{id}",
            get(get_branch).put(update_branch).delete(delete_branch),
        )
}

async fn find_branch(state: &AppState, user: &AuthUser, id: BranchId) -> Result<Branch> {
    state
        .store
        .branches
        .find_by_id(id, user.tenant_id)
        .await?
        .ok_or_else(|| AppError::not_found("Branch"))
}

async fn ensure_manager_exists(
    state: &AppState,
    user: &AuthUser,
    manager_id: Option<UserId>,
) -> Result<()> {
    let Some(manager_id) = manager_id else {
        return Ok(());
    };
    match state
        .store
        .users
        .find_by_id(manager_id, user.tenant_id)
        .await?
    {
        Some(manager) if manager.role.at_least(Role::BranchManager) => Ok(()),
        _ => Err(AppError::BadRequest("Unknown branch manager".to_string())),
    }
}

async fn list_branches(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedQuery(query): ValidatedQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<Branch>>>> {
    let (pagination, filters) = query.into_parts()?;
    AccessCheck::new(&user).branch(filters.branch_id).check()?;

    let page = state
        .store
        .branches
        .find_all(user.tenant_id, &pagination, &filters)
        .await?;
    Ok(ApiResponse::page(page, &pagination))
}

async fn get_branch(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedPath(id): ValidatedPath<BranchId>,
) -> Result<Json<ApiResponse<Branch>>> {
    let branch = find_branch(&state, &user, id).await?;
    Ok(ApiResponse::ok(branch))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBranchRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[serde(default)]
    pub address: Address,
    #[validate(range(min = 1, max = 10000))]
    pub capacity: u32,
    pub manager_id: Option<UserId>,
}

async fn create_branch(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<CreateBranchRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Branch>>)> {
    AccessCheck::new(&user).role(Role::SystemManager).check()?;
    ensure_manager_exists(&state, &user, body.manager_id).await?;

    let now = Utc::now();
    let branch = state
        .store
        .branches
        .create(Branch {
            id: BranchId::new(),
            tenant_id: user.tenant_id,
            name: body.name.trim().to_string(),
            address: body.address,
            capacity: body.capacity,
            manager_id: body.manager_id,
            active: true,
            created_at: now,
            updated_at: now,
        })
        .await?;

    tracing::info!(tenant_id = %user.tenant_id, branch_id = %branch.id, "Branch created");
    Ok((StatusCode::CREATED, ApiResponse::ok(branch)))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBranchRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    pub address: Option<Address>,
    #[validate(range(min = 1, max = 10000))]
    pub capacity: Option<u32>,
    pub manager_id: Option<UserId>,
    pub active: Option<bool>,
}

async fn update_branch(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedPath(id): ValidatedPath<BranchId>,
    ValidatedJson(body): ValidatedJson<UpdateBranchRequest>,
) -> Result<Json<ApiResponse<Branch>>> {
    AccessCheck::new(&user)
        .role(Role::BranchManager)
        .branch(id)
        .check()?;
    ensure_manager_exists(&state, &user, body.manager_id).await?;

    let patch = BranchPatch {
        name: body.name.map(|name| name.trim().to_string()),
        address: body.address,
        capacity: body.capacity,
        manager_id: body.manager_id,
        active: body.active,
    };
    let branch = state
        .store
        .branches
        .update(id, user.tenant_id, patch)
        .await?
        .ok_or_else(|| AppError::not_found("Branch"))?;
    Ok(ApiResponse::ok(branch))
}

async fn delete_branch(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedPath(id): ValidatedPath<BranchId>,
) -> Result<Json<ApiResponse<Message>>> {
    AccessCheck::new(&user).role(Role::SystemManager).check()?;

    let scheduled = state
        .store
        .classes
        .count(
            user.tenant_id,
            &Filters {
                branch_id: Some(id),
                ..Filters::default()
            },
        )
        .await?;
    if scheduled > 0 {
        return Err(AppError::Conflict(format!(
            "Branch still has {scheduled} scheduled classes"
        )));
    }

    if !state.store.branches.delete(id, user.tenant_id).await? {
        return Err(AppError::not_found("Branch"));
    }
    tracing::info!(tenant_id = %user.tenant_id, branch_id = %id, "Branch deleted");
    Ok(ApiResponse::ok(Message {
        message: "Branch deleted",
    }))
}

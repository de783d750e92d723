// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weekly class schedule routes.

use crate::authz::AccessCheck;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::class::is_valid_start_time;
use crate::models::{
    BranchId, ClassId, ClassLevel, ClassPatch, Role, TrainingClass, UserId,
};
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
use chrono::{Utc, Weekday};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/classes", get(list_classes).post(create_class))
        .route(
            "/classes/{id}",
            get(get_class).put(update_class).delete(delete_class),
        )
}

async fn find_class(state: &AppState, user: &AuthUser, id: ClassId) -> Result<TrainingClass> {
    state
        .store
        .classes
        .find_by_id(id, user.tenant_id)
        .await?
        .ok_or_else(|| AppError::not_found("Class"))
}

/// The coach must be a staff member of the caller's tenant.
async fn ensure_coach(state: &AppState, user: &AuthUser, coach_id: UserId) -> Result<()> {
    match state.store.users.find_by_id(coach_id, user.tenant_id).await? {
        Some(coach) if coach.role.at_least(Role::Coach) => Ok(()),
        _ => Err(AppError::BadRequest("Unknown coach".to_string())),
    }
}

fn ensure_start_time(value: &str) -> Result<()> {
    if is_valid_start_time(value) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Invalid startTime (expected HH:MM): {value}"
        )))
    }
}

async fn list_classes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedQuery(query): ValidatedQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<TrainingClass>>>> {
    let (pagination, filters) = query.into_parts()?;
    AccessCheck::new(&user).branch(filters.branch_id).check()?;

    let page = state
        .store
        .classes
        .find_all(user.tenant_id, &pagination, &filters)
        .await?;
    Ok(ApiResponse::page(page, &pagination))
}

async fn get_class(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedPath(id): ValidatedPath<ClassId>,
) -> Result<Json<ApiResponse<TrainingClass>>> {
    let class = find_class(&state, &user, id).await?;
    Ok(ApiResponse::ok(class))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassRequest {
    pub branch_id: BranchId,
    pub coach_id: UserId,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub weekday: Weekday,
    pub start_time: String,
    #[validate(range(min = 5, max = 480))]
    pub duration_minutes: u32,
    #[validate(range(min = 1, max = 1000))]
    pub capacity: u32,
    #[serde(default)]
    pub level: ClassLevel,
}

async fn create_class(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<CreateClassRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TrainingClass>>)> {
    AccessCheck::new(&user)
        .role(Role::Coach)
        .branch(body.branch_id)
        .check()?;
    ensure_start_time(&body.start_time)?;

    if state
        .store
        .branches
        .find_by_id(body.branch_id, user.tenant_id)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest("Unknown branch".to_string()));
    }
    ensure_coach(&state, &user, body.coach_id).await?;

    let now = Utc::now();
    let class = state
        .store
        .classes
        .create(TrainingClass {
            id: ClassId::new(),
            tenant_id: user.tenant_id,
            branch_id: body.branch_id,
            coach_id: body.coach_id,
            name: body.name.trim().to_string(),
            description: body.description,
            weekday: body.weekday,
            start_time: body.start_time,
            duration_minutes: body.duration_minutes,
            capacity: body.capacity,
            level: body.level,
            active: true,
            created_at: now,
            updated_at: now,
        })
        .await?;

    tracing::info!(
        tenant_id = %user.tenant_id,
        class_id = %class.id,
        branch_id = %class.branch_id,
        "Class created"
    );
    Ok((StatusCode::CREATED, ApiResponse::ok(class)))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClassRequest {
    pub coach_id: Option<UserId>,
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub weekday: Option<Weekday>,
    pub start_time: Option<String>,
    #[validate(range(min = 5, max = 480))]
    pub duration_minutes: Option<u32>,
    #[validate(range(min = 1, max = 1000))]
    pub capacity: Option<u32>,
    pub level: Option<ClassLevel>,
    pub active: Option<bool>,
}

async fn update_class(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedPath(id): ValidatedPath<ClassId>,
    ValidatedJson(body): ValidatedJson<UpdateClassRequest>,
) -> Result<Json<ApiResponse<TrainingClass>>> {
    AccessCheck::new(&user).role(Role::Coach).check()?;
    let class = find_class(&state, &user, id).await?;
    AccessCheck::new(&user)
        .tenant(class.tenant_id)
        .branch(class.branch_id)
        .check()?;

    if let Some(start_time) = &body.start_time {
        ensure_start_time(start_time)?;
    }
    if let Some(coach_id) = body.coach_id {
        ensure_coach(&state, &user, coach_id).await?;
    }

    let patch = ClassPatch {
        coach_id: body.coach_id,
        name: body.name.map(|name| name.trim().to_string()),
        description: body.description,
        weekday: body.weekday,
        start_time: body.start_time,
        duration_minutes: body.duration_minutes,
        capacity: body.capacity,
        level: body.level,
        active: body.active,
    };
    let class = state
        .store
        .classes
        .update(id, user.tenant_id, patch)
        .await?
        .ok_or_else(|| AppError::not_found("Class"))?;
    Ok(ApiResponse::ok(class))
}

async fn delete_class(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedPath(id): ValidatedPath<ClassId>,
) -> Result<Json<ApiResponse<Message>>> {
    AccessCheck::new(&user).role(Role::Coach).check()?;
    let class = find_class(&state, &user, id).await?;
    AccessCheck::new(&user)
        .tenant(class.tenant_id)
        .branch(class.branch_id)
        .check()?;

    if !state.store.classes.delete(id, user.tenant_id).await? {
        return Err(AppError::not_found("Class"));
    }
    tracing::info!(tenant_id = %user.tenant_id, class_id = %id, "Class deleted");
    Ok(ApiResponse::ok(Message {
        message: "Class deleted",
    }))
}

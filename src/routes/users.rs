// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User management routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{BranchId, Role, UserId, UserPatch, UserProfile, UserStatus};
use crate::routes::{
    ApiResponse, ListQuery, Message, ValidatedJson, ValidatedPath, ValidatedQuery,
};
use crate::services::NewUser;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedQuery(query): ValidatedQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<UserProfile>>>> {
    let (pagination, filters) = query.into_parts()?;
    let page = state
        .user_service
        .list(&user, &pagination, &filters)
        .await?;
    Ok(ApiResponse::page(page, &pagination))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedPath(id): ValidatedPath<UserId>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    let profile = state.user_service.get(&user, id).await?;
    Ok(ApiResponse::ok(profile))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 1024))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub role: Role,
    pub status: Option<UserStatus>,
    pub branch_id: Option<BranchId>,
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserProfile>>)> {
    let new_user = NewUser {
        email: body.email,
        password: body.password,
        first_name: body.first_name,
        last_name: body.last_name,
        phone: body.phone,
        role: body.role,
        status: body.status,
        branch_id: body.branch_id,
    };
    let profile = state.user_service.create(&user, new_user).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(profile)))
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub branch_id: Option<Option<BranchId>>,
}

impl From<UpdateUserRequest> for UserPatch {
    fn from(body: UpdateUserRequest) -> Self {
        Self {
            email: body.email,
            first_name: body.first_name,
            last_name: body.last_name,
            phone: body.phone,
            role: body.role,
            status: body.status,
            branch_id: body.branch_id,
        }
    }
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedPath(id): ValidatedPath<UserId>,
    ValidatedJson(body): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    let profile = state.user_service.update(&user, id, body.into()).await?;
    Ok(ApiResponse::ok(profile))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedPath(id): ValidatedPath<UserId>,
) -> Result<Json<ApiResponse<Message>>> {
    state.user_service.delete(&user, id).await?;
    Ok(ApiResponse::ok(Message {
        message: "User deleted",
    }))
}

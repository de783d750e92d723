// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication routes: login, registration, token refresh, password and
//! email-verification flows.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{BranchId, Role, UserProfile};
use crate::routes::{ApiResponse, Message, ValidatedJson, ValidatedPath};
use crate::services::{AuthSession, Registration, TokenPair};
use crate::AppState;

const MIN_PASSWORD_LEN: u64 = 8;

/// Routes reachable without a bearer token.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/refresh", post(refresh))
        .route("/auth/request-password-reset", post(request_password_reset))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/verify-email/{token}", get(verify_email))
        .route("/auth/resend-verification", post(resend_verification))
}

/// Routes that act on the signed-in user.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/change-password", post(change_password))
        .route("/auth/logout", post(logout))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 1024))]
    pub password: String,
    #[validate(length(min = 1, max = 253))]
    pub tenant_domain: String,
}

/// Authenticate against a tenant and receive a token pair.
async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthSession>>> {
    let session = state
        .auth_service
        .login(&body.email, &body.password, &body.tenant_domain)
        .await?;
    Ok(ApiResponse::ok(session))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = MIN_PASSWORD_LEN, max = 1024))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub role: Option<Role>,
    #[validate(length(min = 1, max = 253))]
    pub tenant_domain: String,
    pub branch_id: Option<BranchId>,
}

/// Self-register a student account.
async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthSession>>)> {
    let registration = Registration {
        email: body.email,
        password: body.password,
        first_name: body.first_name,
        last_name: body.last_name,
        phone: body.phone,
        role: body.role,
        tenant_domain: body.tenant_domain,
        branch_id: body.branch_id,
    };

    // An unknown tenant is a client input problem here, not an auth failure.
    let session = state
        .auth_service
        .register(registration)
        .await
        .map_err(|e| match e {
            AppError::InvalidTenant => AppError::BadRequest("Invalid tenant".to_string()),
            other => other,
        })?;
    Ok((StatusCode::CREATED, ApiResponse::ok(session)))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// Exchange a refresh token for a new pair.
async fn refresh(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<RefreshRequest>,
) -> Result<Json<ApiResponse<TokenPair>>> {
    let tokens = state.auth_service.refresh(&body.refresh_token).await?;
    Ok(ApiResponse::ok(tokens))
}

/// Profile of the bearer.
async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    let profile = state
        .auth_service
        .profile(user.user_id, user.tenant_id)
        .await?;
    Ok(ApiResponse::ok(profile))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, max = 1024))]
    pub current_password: String,
    #[validate(length(min = MIN_PASSWORD_LEN, max = 1024))]
    pub new_password: String,
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<Message>>> {
    state
        .auth_service
        .change_password(
            user.user_id,
            user.tenant_id,
            &body.current_password,
            &body.new_password,
        )
        .await?;
    Ok(ApiResponse::ok(Message {
        message: "Password changed",
    }))
}

/// Tokens are stateless; the client simply discards them.
async fn logout(Extension(user): Extension<AuthUser>) -> Json<ApiResponse<Message>> {
    tracing::info!(user_id = %user.user_id, tenant_id = %user.tenant_id, "User logged out");
    ApiResponse::ok(Message {
        message: "Logged out",
    })
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AccountEmailRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 253))]
    pub tenant_domain: String,
}

/// Always answers the same way, whether or not the account exists.
async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<AccountEmailRequest>,
) -> Result<Json<ApiResponse<Message>>> {
    state
        .auth_service
        .request_password_reset(&body.email, &body.tenant_domain)
        .await?;
    Ok(ApiResponse::ok(Message {
        message: "If the account exists, a reset link has been sent",
    }))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, max = 512))]
    pub token: String,
    #[validate(length(min = MIN_PASSWORD_LEN, max = 1024))]
    pub new_password: String,
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<Message>>> {
    state
        .auth_service
        .reset_password(&body.token, &body.new_password)
        .await?;
    Ok(ApiResponse::ok(Message {
        message: "Password has been reset",
    }))
}

async fn verify_email(
    State(state): State<Arc<AppState>>,
    ValidatedPath(token): ValidatedPath<String>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    let profile = state.auth_service.verify_email(&token).await?;
    Ok(ApiResponse::ok(profile))
}

async fn resend_verification(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<AccountEmailRequest>,
) -> Result<Json<ApiResponse<Message>>> {
    state
        .auth_service
        .resend_verification(&body.email, &body.tenant_domain)
        .await?;
    Ok(ApiResponse::ok(Message {
        message: "If the account needs verification, an email has been sent",
    }))
}

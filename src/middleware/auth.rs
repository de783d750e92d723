// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer-token authentication middleware.

use crate::error::AppError;
use crate::models::{BranchId, Role, TenantId, UserId};
use crate::services::token::{extract_bearer, SessionClaims};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated caller, taken from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub role: Role,
    pub email: String,
    pub branch_id: Option<BranchId>,
}

impl From<SessionClaims> for AuthUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.user_id,
            tenant_id: claims.tenant_id,
            role: claims.role,
            email: claims.email,
            branch_id: claims.branch_id,
        }
    }
}

/// Middleware that requires a valid access token.
///
/// A missing or malformed `Authorization` header is `Unauthorized`; a token
/// that fails verification is `InvalidToken`. Both answer 401.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = extract_bearer(header_value) else {
        return Err(AppError::Unauthorized);
    };

    let claims = state.tokens.verify_access_token(token)?;
    let auth_user = AuthUser::from(claims);
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

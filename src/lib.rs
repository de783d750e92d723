// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Academy server: multi-tenant access control for academy management.
//!
//! This crate provides the backend API that authenticates members of an
//! academy (tenant), issues bearer tokens, and guards every tenant-scoped
//! record behind role, tenant, branch and self-access checks.

pub mod authz;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Store;
use error::AppError;
use services::{AuthService, Mailer, PasswordService, TokenCodec, UserService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub tokens: TokenCodec,
    pub passwords: PasswordService,
    pub auth_service: AuthService,
    pub user_service: UserService,
}

impl AppState {
    /// Wire services around an existing store.
    pub fn new(config: Config, store: Store, mailer: Arc<dyn Mailer>) -> Result<Self, AppError> {
        let tokens = TokenCodec::from_config(&config);
        let passwords = PasswordService::from_config(&config)?;
        let auth_service = AuthService::new(
            store.clone(),
            tokens.clone(),
            passwords.clone(),
            mailer.clone(),
            config.password_reset_ttl,
        );
        let user_service = UserService::new(store.clone(), passwords.clone(), mailer);

        Ok(Self {
            config,
            store,
            tokens,
            passwords,
            auth_service,
            user_service,
        })
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod mailer;
pub mod password;
pub mod provisioning;
pub mod token;
pub mod users;

pub use auth::{AuthService, AuthSession, Registration};
pub use mailer::{Mailer, TracingMailer};
pub use password::PasswordService;
pub use provisioning::{provision_tenant, TenantProvisioning};
pub use token::{SessionClaims, TokenCodec, TokenPair};
pub use users::{NewUser, UserService};

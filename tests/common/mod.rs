// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use academy_server::config::Config;
use academy_server::db::Store;
use academy_server::models::{
    Branch, BranchId, Role, SubscriptionPlan, Tenant, TenantId, User, UserId, UserStatus,
};
use academy_server::routes::create_router;
use academy_server::services::auth::session_claims;
use academy_server::services::Mailer;
use academy_server::AppState;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::{Duration, Utc};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const PASSWORD: &str = "correct-horse-battery";
pub const DEMO_DOMAIN: &str = "demo.jiu-jitsu.com";
pub const OTHER_DOMAIN: &str = "other.jiu-jitsu.com";

/// Message captured by [`RecordingMailer`].
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct SentMail {
    pub kind: &'static str,
    pub email: String,
    pub token: String,
}

/// Mailer that keeps every message for inspection.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
}

#[allow(dead_code)]
impl RecordingMailer {
    pub fn last_token(&self, kind: &str, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|mail| mail.kind == kind && mail.email == email)
            .map(|mail| mail.token.clone())
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn record(&self, kind: &'static str, email: &str, token: &str) {
        self.sent.lock().unwrap().push(SentMail {
            kind,
            email: email.to_string(),
            token: token.to_string(),
        });
    }
}

impl Mailer for RecordingMailer {
    fn send_password_reset(&self, email: &str, token: &str) {
        self.record("password_reset", email, token);
    }

    fn send_email_verification(&self, email: &str, token: &str) {
        self.record("email_verification", email, token);
    }
}

/// Router, state, and two seeded tenants with one branch each.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub mailer: Arc<RecordingMailer>,
    pub tenant: Tenant,
    pub branch: Branch,
    pub other_tenant: Tenant,
    pub other_branch: Branch,
}

/// Create a test app over a fresh in-memory store.
#[allow(dead_code)]
pub async fn create_test_app() -> TestApp {
    let config = Config::test_default();
    let mailer = Arc::new(RecordingMailer::default());
    let state = Arc::new(
        AppState::new(config, Store::init(), mailer.clone()).expect("Failed to build state"),
    );

    let tenant = seed_tenant(&state, DEMO_DOMAIN, Duration::days(365)).await;
    let branch = seed_branch(&state, tenant.id, "Downtown").await;
    let other_tenant = seed_tenant(&state, OTHER_DOMAIN, Duration::days(365)).await;
    let other_branch = seed_branch(&state, other_tenant.id, "Uptown").await;

    TestApp {
        router: create_router(state.clone()),
        state,
        mailer,
        tenant,
        branch,
        other_tenant,
        other_branch,
    }
}

/// Insert an active tenant whose license ends `license_left` from now.
#[allow(dead_code)]
pub async fn seed_tenant(state: &AppState, domain: &str, license_left: Duration) -> Tenant {
    let now = Utc::now();
    state
        .store
        .tenants
        .create(Tenant {
            id: TenantId::new(),
            name: domain.to_string(),
            domain: domain.to_string(),
            plan: SubscriptionPlan::Professional,
            license_start: now - Duration::days(30),
            license_end: now + license_left,
            active: true,
            contact_email: None,
            contact_phone: None,
            settings: Default::default(),
            current_users: 0,
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("Failed to seed tenant")
}

#[allow(dead_code)]
pub async fn seed_branch(state: &AppState, tenant_id: TenantId, name: &str) -> Branch {
    let now = Utc::now();
    state
        .store
        .branches
        .create(Branch {
            id: BranchId::new(),
            tenant_id,
            name: name.to_string(),
            address: Default::default(),
            capacity: 50,
            manager_id: None,
            active: true,
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("Failed to seed branch")
}

/// Insert a user with [`PASSWORD`].
#[allow(dead_code)]
pub async fn seed_user(
    state: &AppState,
    tenant_id: TenantId,
    email: &str,
    role: Role,
    status: UserStatus,
    branch_id: Option<BranchId>,
) -> User {
    let now = Utc::now();
    let password_hash = state
        .passwords
        .hash(PASSWORD)
        .await
        .expect("Failed to hash password");
    state
        .store
        .users
        .create(User {
            id: UserId::new(),
            tenant_id,
            email: email.to_lowercase(),
            password_hash,
            first_name: "Test".to_string(),
            last_name: role.to_string(),
            phone: None,
            role,
            status,
            branch_id,
            email_verified: status == UserStatus::Active,
            email_verification_token: None,
            password_reset_token: None,
            password_reset_expires: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("Failed to seed user")
}

/// Access token for `user`, as issued at login.
#[allow(dead_code)]
pub fn bearer(state: &AppState, user: &User) -> String {
    state
        .tokens
        .issue_access_token(&session_claims(user))
        .expect("Failed to issue token")
}

/// Send one request through the router and decode the JSON reply.
#[allow(dead_code)]
pub async fn send(
    router: &axum::Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

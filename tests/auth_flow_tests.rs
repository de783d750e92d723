// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end tests for the credential and session lifecycle.
//!
//! These tests verify that:
//! 1. Login issues tokens carrying the stored tenant and role
//! 2. Every login failure is a coarse 401 and unknown emails look like bad passwords
//! 3. Registration, refresh, password change/reset and email verification
//!    follow their state transitions

use academy_server::models::{Role, TenantPatch, UserStatus};
use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::{json, Value};

mod common;
use common::{send, PASSWORD};

fn login_body(email: &str, password: &str, domain: &str) -> Value {
    json!({ "email": email, "password": password, "tenantDomain": domain })
}

fn register_body(email: &str) -> Value {
    json!({
        "email": email,
        "password": "new-student-password",
        "firstName": "Ana",
        "lastName": "Silva",
        "tenantDomain": common::DEMO_DOMAIN,
    })
}

#[tokio::test]
async fn test_happy_login_claims_match_stored_user() {
    let app = common::create_test_app().await;
    let admin = common::seed_user(
        &app.state,
        app.tenant.id,
        "admin@demo.jiu-jitsu.com",
        Role::SystemManager,
        UserStatus::Active,
        None,
    )
    .await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/auth/login",
        None,
        Some(login_body("Admin@Demo.Jiu-Jitsu.com", PASSWORD, common::DEMO_DOMAIN)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let data = &body["data"];
    assert!(data["user"].get("passwordHash").is_none());
    assert_eq!(data["tenant"]["domain"], common::DEMO_DOMAIN);

    let claims = app
        .state
        .tokens
        .verify_access_token(data["accessToken"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.tenant_id, app.tenant.id);
    assert_eq!(claims.user_id, admin.id);
    assert_eq!(claims.role, Role::SystemManager);
    assert!(data["refreshToken"].as_str().is_some());
}

#[tokio::test]
async fn test_expired_license_blocks_login() {
    let app = common::create_test_app().await;
    let tenant =
        common::seed_tenant(&app.state, "expired.jiu-jitsu.com", Duration::days(-1)).await;
    common::seed_user(
        &app.state,
        tenant.id,
        "admin@expired.jiu-jitsu.com",
        Role::SystemManager,
        UserStatus::Active,
        None,
    )
    .await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/auth/login",
        None,
        Some(login_body(
            "admin@expired.jiu-jitsu.com",
            PASSWORD,
            "expired.jiu-jitsu.com",
        )),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "license_expired");
}

#[tokio::test]
async fn test_unknown_email_and_wrong_password_are_indistinguishable() {
    let app = common::create_test_app().await;
    common::seed_user(
        &app.state,
        app.tenant.id,
        "exists@demo.jiu-jitsu.com",
        Role::Student,
        UserStatus::Active,
        None,
    )
    .await;

    let wrong_password = send(
        &app.router,
        Method::POST,
        "/auth/login",
        None,
        Some(login_body("exists@demo.jiu-jitsu.com", "wrongpass", common::DEMO_DOMAIN)),
    )
    .await;
    let unknown_email = send(
        &app.router,
        Method::POST,
        "/auth/login",
        None,
        Some(login_body("doesnotexist@demo.jiu-jitsu.com", "anything", common::DEMO_DOMAIN)),
    )
    .await;

    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password.1["error"], "invalid_credentials");
}

#[tokio::test]
async fn test_login_refusals() {
    let app = common::create_test_app().await;
    for (email, status, code) in [
        ("suspended@demo.jiu-jitsu.com", UserStatus::Suspended, "account_suspended"),
        ("inactive@demo.jiu-jitsu.com", UserStatus::Inactive, "account_inactive"),
    ] {
        common::seed_user(&app.state, app.tenant.id, email, Role::Student, status, None).await;
        let (http, body) = send(
            &app.router,
            Method::POST,
            "/auth/login",
            None,
            Some(login_body(email, PASSWORD, common::DEMO_DOMAIN)),
        )
        .await;
        assert_eq!(http, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], code);
    }

    let (http, body) = send(
        &app.router,
        Method::POST,
        "/auth/login",
        None,
        Some(login_body("a@b.com", PASSWORD, "nowhere.example.com")),
    )
    .await;
    assert_eq!(http, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_tenant");
}

#[tokio::test]
async fn test_user_cannot_log_into_another_tenant() {
    let app = common::create_test_app().await;
    common::seed_user(
        &app.state,
        app.tenant.id,
        "member@demo.jiu-jitsu.com",
        Role::Coach,
        UserStatus::Active,
        None,
    )
    .await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/auth/login",
        None,
        Some(login_body("member@demo.jiu-jitsu.com", PASSWORD, common::OTHER_DOMAIN)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credentials");
}

#[tokio::test]
async fn test_register_flow() {
    let app = common::create_test_app().await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/auth/register",
        None,
        Some(register_body("ana@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["user"]["status"], "pending");
    assert_eq!(body["data"]["user"]["role"], "student");
    assert_eq!(body["data"]["tenant"]["currentUsers"], 1);
    assert!(body["data"]["accessToken"].as_str().is_some());
    assert!(app
        .mailer
        .last_token("email_verification", "ana@example.com")
        .is_some());

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/auth/register",
        None,
        Some(register_body("ANA@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "duplicate_user");

    // Same email is free in another tenant.
    let mut other = register_body("ana@example.com");
    other["tenantDomain"] = json!(common::OTHER_DOMAIN);
    let (status, _) = send(&app.router, Method::POST, "/auth/register", None, Some(other)).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_register_rejections() {
    let app = common::create_test_app().await;

    let mut unknown_tenant = register_body("x@example.com");
    unknown_tenant["tenantDomain"] = json!("nowhere.example.com");
    let (status, _) = send(
        &app.router,
        Method::POST,
        "/auth/register",
        None,
        Some(unknown_tenant),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut elevated = register_body("y@example.com");
    elevated["role"] = json!("system_manager");
    let (status, body) =
        send(&app.router, Method::POST, "/auth/register", None, Some(elevated)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let mut short_password = register_body("z@example.com");
    short_password["password"] = json!("short");
    let (status, body) = send(
        &app.router,
        Method::POST,
        "/auth/register",
        None,
        Some(short_password),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_refresh_rotates_and_rejects_type_confusion() {
    let app = common::create_test_app().await;
    let (_, session) = send(
        &app.router,
        Method::POST,
        "/auth/register",
        None,
        Some(register_body("ana@example.com")),
    )
    .await;
    let access = session["data"]["accessToken"].as_str().unwrap();
    let refresh = session["data"]["refreshToken"].as_str().unwrap();

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/auth/refresh",
        None,
        Some(json!({ "refreshToken": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["accessToken"].as_str().is_some());
    assert!(body["data"]["refreshToken"].as_str().is_some());

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/auth/refresh",
        None,
        Some(json!({ "refreshToken": access })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");

    // A refresh token is not a bearer credential.
    let (status, _) = send(&app.router, Method::GET, "/auth/me", Some(refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_refused_once_suspended() {
    let app = common::create_test_app().await;
    let user = common::seed_user(
        &app.state,
        app.tenant.id,
        "member@demo.jiu-jitsu.com",
        Role::Student,
        UserStatus::Active,
        None,
    )
    .await;
    let refresh = app
        .state
        .tokens
        .issue_refresh_token(user.id, user.tenant_id)
        .unwrap();

    app.state
        .store
        .users
        .update_with(user.id, user.tenant_id, |u| u.status = UserStatus::Suspended)
        .await
        .unwrap();

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/auth/refresh",
        None,
        Some(json!({ "refreshToken": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "account_suspended");
}

#[tokio::test]
async fn test_refresh_refused_after_license_lapses() {
    let app = common::create_test_app().await;
    common::seed_user(
        &app.state,
        app.tenant.id,
        "member@demo.jiu-jitsu.com",
        Role::Student,
        UserStatus::Active,
        None,
    )
    .await;

    let (status, session) = send(
        &app.router,
        Method::POST,
        "/auth/login",
        None,
        Some(login_body("member@demo.jiu-jitsu.com", PASSWORD, common::DEMO_DOMAIN)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let refresh = session["data"]["refreshToken"].as_str().unwrap();

    app.state
        .store
        .tenants
        .update(
            app.tenant.id,
            app.tenant.id,
            TenantPatch {
                license_end: Some(Utc::now() - Duration::days(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/auth/refresh",
        None,
        Some(json!({ "refreshToken": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "license_expired");
}

#[tokio::test]
async fn test_change_password() {
    let app = common::create_test_app().await;
    let user = common::seed_user(
        &app.state,
        app.tenant.id,
        "member@demo.jiu-jitsu.com",
        Role::Student,
        UserStatus::Active,
        None,
    )
    .await;
    let token = common::bearer(&app.state, &user);

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/auth/change-password",
        None,
        Some(json!({ "currentPassword": PASSWORD, "newPassword": "brand-new-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/auth/change-password",
        Some(&token),
        Some(json!({ "currentPassword": "not-it", "newPassword": "brand-new-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/auth/change-password",
        Some(&token),
        Some(json!({ "currentPassword": PASSWORD, "newPassword": "brand-new-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/auth/login",
        None,
        Some(login_body(
            "member@demo.jiu-jitsu.com",
            "brand-new-password",
            common::DEMO_DOMAIN,
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_password_reset_is_silent_and_single_use() {
    let app = common::create_test_app().await;
    common::seed_user(
        &app.state,
        app.tenant.id,
        "member@demo.jiu-jitsu.com",
        Role::Student,
        UserStatus::Active,
        None,
    )
    .await;

    let unknown = send(
        &app.router,
        Method::POST,
        "/auth/request-password-reset",
        None,
        Some(json!({ "email": "ghost@demo.jiu-jitsu.com", "tenantDomain": common::DEMO_DOMAIN })),
    )
    .await;
    let known = send(
        &app.router,
        Method::POST,
        "/auth/request-password-reset",
        None,
        Some(json!({ "email": "member@demo.jiu-jitsu.com", "tenantDomain": common::DEMO_DOMAIN })),
    )
    .await;
    assert_eq!(unknown, known);
    assert_eq!(known.0, StatusCode::OK);
    assert_eq!(app.mailer.count(), 1);

    let token = app
        .mailer
        .last_token("password_reset", "member@demo.jiu-jitsu.com")
        .unwrap();
    assert!(token.starts_with(&app.tenant.id.to_string()));

    let reset = json!({ "token": token, "newPassword": "reset-password-1" });
    let (status, _) = send(
        &app.router,
        Method::POST,
        "/auth/reset-password",
        None,
        Some(reset.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        send(&app.router, Method::POST, "/auth/reset-password", None, Some(reset)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_token");

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/auth/login",
        None,
        Some(login_body(
            "member@demo.jiu-jitsu.com",
            "reset-password-1",
            common::DEMO_DOMAIN,
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_reset_token_rejected() {
    let app = common::create_test_app().await;
    let user = common::seed_user(
        &app.state,
        app.tenant.id,
        "member@demo.jiu-jitsu.com",
        Role::Student,
        UserStatus::Active,
        None,
    )
    .await;
    send(
        &app.router,
        Method::POST,
        "/auth/request-password-reset",
        None,
        Some(json!({ "email": "member@demo.jiu-jitsu.com", "tenantDomain": common::DEMO_DOMAIN })),
    )
    .await;
    let token = app
        .mailer
        .last_token("password_reset", "member@demo.jiu-jitsu.com")
        .unwrap();

    app.state
        .store
        .users
        .update_with(user.id, user.tenant_id, |u| {
            u.password_reset_expires = Some(chrono::Utc::now() - Duration::minutes(1));
        })
        .await
        .unwrap();

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/auth/reset-password",
        None,
        Some(json!({ "token": token, "newPassword": "reset-password-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_verify_email_activates_pending_account() {
    let app = common::create_test_app().await;
    send(
        &app.router,
        Method::POST,
        "/auth/register",
        None,
        Some(register_body("ana@example.com")),
    )
    .await;
    let first = app
        .mailer
        .last_token("email_verification", "ana@example.com")
        .unwrap();

    // Resending replaces the outstanding token.
    let (status, _) = send(
        &app.router,
        Method::POST,
        "/auth/resend-verification",
        None,
        Some(json!({ "email": "ana@example.com", "tenantDomain": common::DEMO_DOMAIN })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let second = app
        .mailer
        .last_token("email_verification", "ana@example.com")
        .unwrap();
    assert_ne!(first, second);

    let (status, _) = send(
        &app.router,
        Method::GET,
        &format!("/auth/verify-email/{first}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app.router,
        Method::GET,
        &format!("/auth/verify-email/{second}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "active");
    assert_eq!(body["data"]["emailVerified"], true);

    let (status, _) = send(
        &app.router,
        Method::GET,
        &format!("/auth/verify-email/{second}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_me_and_logout() {
    let app = common::create_test_app().await;
    let user = common::seed_user(
        &app.state,
        app.tenant.id,
        "member@demo.jiu-jitsu.com",
        Role::Coach,
        UserStatus::Active,
        Some(app.branch.id),
    )
    .await;
    let token = common::bearer(&app.state, &user);

    let (status, body) = send(&app.router, Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "member@demo.jiu-jitsu.com");
    assert_eq!(body["data"]["branchId"], app.branch.id.to_string());

    let (status, _) = send(&app.router, Method::POST, "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app.router, Method::GET, "/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

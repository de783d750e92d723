// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Academy API Server
//!
//! Authenticates academy members per tenant and serves the tenant-scoped
//! user, branch and class records behind role-based access checks.

use academy_server::{
    config::Config,
    db::Store,
    error::AppError,
    services::{provision_tenant, TenantProvisioning, TracingMailer},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Academy API");

    let store = Store::init();
    let state = Arc::new(
        AppState::new(config.clone(), store.clone(), Arc::new(TracingMailer))
            .expect("Failed to initialize services"),
    );

    if let Some(bootstrap) = &config.bootstrap {
        match provision_tenant(&store, &state.passwords, TenantProvisioning::from(bootstrap)).await
        {
            Ok((tenant, admin)) => tracing::info!(
                tenant_id = %tenant.id,
                domain = %tenant.domain,
                admin_id = %admin.id,
                "Bootstrap tenant ready"
            ),
            Err(AppError::Conflict(_)) => {
                tracing::info!(domain = %bootstrap.tenant_domain, "Bootstrap tenant already exists")
            }
            Err(e) => return Err(e.into()),
        }
    }

    // Build router
    let app = academy_server::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.teardown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("academy_server=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}

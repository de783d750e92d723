// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outbound account email (password reset, email verification).
//!
//! Delivery is an external collaborator; the default implementation only
//! records that a message would have been sent.

/// Sends account lifecycle messages carrying one-time tokens.
pub trait Mailer: Send + Sync {
    fn send_password_reset(&self, email: &str, token: &str);
    fn send_email_verification(&self, email: &str, token: &str);
}

/// Mailer that logs the recipient and drops the message.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMailer;

impl Mailer for TracingMailer {
    fn send_password_reset(&self, email: &str, _token: &str) {
        tracing::info!(recipient = %email, kind = "password_reset", "Account email queued");
    }

    fn send_email_verification(&self, email: &str, _token: &str) {
        tracing::info!(recipient = %email, kind = "email_verification", "Account email queued");
    }
}

//! Contact email flow.
//!
//! Dispatch goes through a `Mailer` so tests can substitute the provider.
//! Senders are throttled by a persisted per-address counter; once it passes
//! the cap the endpoint keeps reporting success without sending anything.

use crate::mirror::ApiError;
use crate::mirror_store::MirrorStore;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A sender may trigger this many emails before being silently throttled.
pub const MAX_SENDS_PER_ADDRESS: i64 = 5;

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Dispatch a contact notification for the given visitor address.
    async fn send_contact_email(&self, visitor_email: &str) -> Result<()>;
}

pub struct ContactService {
    store: Arc<dyn MirrorStore>,
    mailer: Arc<dyn Mailer>,
}

impl ContactService {
    pub fn new(store: Arc<dyn MirrorStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self { store, mailer }
    }

    /// Returns whether the caller should be told the email was sent.
    ///
    /// Throttled senders get `true` without any dispatch or counter change;
    /// a provider failure is reported as `false` rather than an error.
    pub async fn send_contact(&self, visitor_email: &str) -> Result<bool, ApiError> {
        let times_sent = self.store.get_times_sent(visitor_email)?.unwrap_or(0);
        if times_sent > MAX_SENDS_PER_ADDRESS {
            debug!(
                "Sender {} over the send cap ({} sends), skipping dispatch",
                visitor_email, times_sent
            );
            return Ok(true);
        }

        if let Err(err) = self.mailer.send_contact_email(visitor_email).await {
            warn!("Contact email dispatch failed: {:#}", err);
            return Ok(false);
        }

        self.store.record_email_sent(visitor_email)?;
        Ok(true)
    }
}

/// Minimal address shape check, applied before any I/O.
pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

// =============================================================================
// Resend mailer
// =============================================================================

const MAIL_TIMEOUT_SEC: u64 = 15;

#[derive(Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
}

/// Mailer backed by the Resend HTTP API.
pub struct ResendMailer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    from_address: String,
    to_address: String,
}

impl ResendMailer {
    pub fn new(base_url: String, api_key: String, from_address: String, to_address: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(MAIL_TIMEOUT_SEC))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            from_address,
            to_address,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send_contact_email(&self, visitor_email: &str) -> Result<()> {
        let body = SendEmailBody {
            from: &self.from_address,
            to: [&self.to_address],
            subject: "New contact request",
            html: format!("<p>Contact request from <strong>{}</strong></p>", visitor_email),
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to reach email provider")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("Email provider returned status {}: {}", status, text);
        }
        Ok(())
    }
}

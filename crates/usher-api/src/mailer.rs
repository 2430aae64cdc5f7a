//! Invitation email composition and delivery.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;

use usher_core::{EmailProvider, Error, Invitation, Result, Store, User};

use crate::state::AppState;

/// Compose and send the invitation notification.
///
/// The acceptance link embeds the invitation id as the bearer token:
/// `{base_url}/invite/{invitation_id}`.
pub async fn send_invitation_email<S: Store>(
    state: &AppState<S>,
    to: &str,
    invitation: &Invitation,
    inviter: &User,
) -> Result<()> {
    let mailer = state.mailer()?;

    let invite_link = format!(
        "{}/invite/{}",
        state.config.base_url.trim_end_matches('/'),
        invitation.id
    );

    let subject = match &inviter.name {
        Some(name) => format!("{} invited you to join {}", name, state.config.app_name),
        None => "You've been invited!".to_string(),
    };

    let intro = match &inviter.name {
        Some(name) => format!("<p><strong>{name}</strong> has invited you to join an organization.</p>"),
        None => "<p>You have been invited to join an organization.</p>".to_string(),
    };

    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>You've been invited!</h2>
  {intro}
  <p>Click the button below to accept the invitation:</p>
  <a href="{invite_link}" style="display: inline-block; padding: 12px 24px; background-color: #0070f3; color: white; text-decoration: none; border-radius: 5px; margin: 20px 0;">Accept Invitation</a>
  <p>Or copy and paste this link into your browser:</p>
  <p style="word-break: break-all; color: #666;">{invite_link}</p>
</div>"#
    );

    let text = format!(
        "You have been invited to join an organization.\n\nAccept the invitation: {invite_link}"
    );

    mailer.send(to, &subject, &html, &text).await
}

// ---------------------------------------------------------------------------
// Resend provider
// ---------------------------------------------------------------------------

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Debug, Serialize)]
struct ResendSendBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    html: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    text: &'a str,
}

/// [`EmailProvider`] backed by the Resend HTTP API.
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            from: from.into(),
        }
    }
}

#[async_trait]
impl EmailProvider for ResendMailer {
    async fn send(&self, to: &str, subject: &str, html: &str, text: &str) -> Result<()> {
        let body = ResendSendBody {
            from: &self.from,
            to: [to],
            subject,
            html,
            text,
        };

        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Email(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Email(format!(
                "Resend returned {status}: {detail}"
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Recording mailer (tests, local development)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// In-memory mailer that records every send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<SentEmail>>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_messages(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Handle onto the sent list that stays valid after the mailer is moved
    /// into an `Arc<dyn EmailProvider>`.
    pub fn outbox(&self) -> Arc<Mutex<Vec<SentEmail>>> {
        self.sent.clone()
    }
}

#[async_trait]
impl EmailProvider for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html: &str, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}

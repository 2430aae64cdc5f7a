use async_trait::async_trait;

use crate::error::Result;

/// Trait for sending emails. Implement this to integrate with your
/// transactional email service (Resend, SES, SMTP, etc.).
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Send an email.
    ///
    /// - `to`: recipient email address
    /// - `subject`: email subject line
    /// - `html`: HTML body (may be empty)
    /// - `text`: plain-text body (may be empty)
    async fn send(&self, to: &str, subject: &str, html: &str, text: &str) -> Result<()>;
}

/// Development email provider that logs emails instead of delivering them.
pub struct ConsoleEmailProvider;

#[async_trait]
impl EmailProvider for ConsoleEmailProvider {
    async fn send(&self, to: &str, subject: &str, _html: &str, text: &str) -> Result<()> {
        eprintln!("[EMAIL] To: {to} | Subject: {subject} | Body: {text}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct RecordingProvider {
        sent: Arc<Mutex<Vec<(String, String)>>>,
    }

    #[async_trait]
    impl EmailProvider for RecordingProvider {
        async fn send(&self, to: &str, subject: &str, _html: &str, _text: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn console_provider_send_succeeds() {
        let provider = ConsoleEmailProvider;
        assert!(
            provider
                .send("user@example.com", "Hello", "<p>hi</p>", "hi")
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn recording_provider_captures_sends() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let provider = RecordingProvider { sent: sent.clone() };
        provider.send("a@b.com", "One", "", "body").await.unwrap();
        provider.send("c@d.com", "Two", "", "body").await.unwrap();

        let messages = sent.lock().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].0, "a@b.com");
        assert_eq!(messages[1].1, "Two");
    }

    #[tokio::test]
    async fn trait_object_dispatch_works() {
        let provider: Box<dyn EmailProvider> = Box::new(ConsoleEmailProvider);
        assert!(provider.send("user@example.com", "Test", "", "body").await.is_ok());
    }
}

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use jobdesk_core::types::EmailCommunication;
use jobdesk_mail::{MailError, MailRelayClient, OutgoingMail};
use jobdesk_util::MailRelayConfig;

/// Hands finished mail to the outside world.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &EmailCommunication) -> Result<(), SendError>;
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("mail relay rejected message: {0}")]
    Relay(#[from] MailError),
}

/// Sender used when no relay is configured; the message only reaches the log.
#[derive(Debug, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, email: &EmailCommunication) -> Result<(), SendError> {
        info!(
            stage = "mail",
            to = %email.to_address,
            cc = email.cc_address.as_deref().unwrap_or(""),
            bcc = email.bcc_address.as_deref().unwrap_or(""),
            subject = %email.subject,
            "mail relay not configured; message logged only"
        );
        Ok(())
    }
}

/// Delivers mail through the HTTP relay.
pub struct RelayEmailSender {
    client: MailRelayClient,
}

impl RelayEmailSender {
    pub fn new(client: MailRelayClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmailSender for RelayEmailSender {
    async fn send(&self, email: &EmailCommunication) -> Result<(), SendError> {
        let receipt = self
            .client
            .send(&OutgoingMail {
                to: &email.to_address,
                cc: email.cc_address.as_deref(),
                bcc: email.bcc_address.as_deref(),
                subject: &email.subject,
                body: &email.body,
            })
            .await?;
        info!(stage = "mail", to = %email.to_address, relay_id = %receipt.id, "mail handed to relay");
        Ok(())
    }
}

/// Picks the relay sender when configured, the log sender otherwise.
pub fn sender_from_config(
    config: Option<&MailRelayConfig>,
) -> Result<Arc<dyn EmailSender>, reqwest::Error> {
    let Some(config) = config else {
        return Ok(Arc::new(LogEmailSender));
    };

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    let client = MailRelayClient::new(config.base_url.clone(), config.token.clone(), http);
    Ok(Arc::new(RelayEmailSender::new(client)))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Captures every message instead of sending it; optionally fails each send.
    #[derive(Default)]
    pub struct RecordingEmailSender {
        sent: Mutex<Vec<EmailCommunication>>,
        fail: bool,
    }

    impl RecordingEmailSender {
        pub fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn sent(&self) -> Vec<EmailCommunication> {
            self.sent.lock().expect("sent lock poisoned").clone()
        }
    }

    #[async_trait]
    impl EmailSender for RecordingEmailSender {
        async fn send(&self, email: &EmailCommunication) -> Result<(), SendError> {
            self.sent
                .lock()
                .expect("sent lock poisoned")
                .push(email.clone());
            if self.fail {
                return Err(SendError::Relay(MailError::Status {
                    status: reqwest::StatusCode::BAD_GATEWAY,
                    body: "relay down".into(),
                }));
            }
            Ok(())
        }
    }
}

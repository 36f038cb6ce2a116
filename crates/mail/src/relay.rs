use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Client for the HTTP mail relay that delivers outbound company mail.
#[derive(Clone)]
pub struct MailRelayClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl MailRelayClient {
    /// Creates a new relay client. `base_url` should end with a `/`.
    pub fn new(base_url: Url, token: Option<String>, http: Client) -> Self {
        Self {
            http,
            base_url,
            token,
        }
    }

    /// Submits a message for delivery and returns the relay's receipt.
    pub async fn send(&self, mail: &OutgoingMail<'_>) -> Result<RelayReceipt, MailError> {
        let url = self.base_url.join("messages")?;

        let mut request = self.http.post(url).json(mail);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        parse_json::<RelayReceipt>(response).await
    }
}

/// Message payload accepted by the relay.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingMail<'a> {
    pub to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcc: Option<&'a str>,
    pub subject: &'a str,
    pub body: &'a str,
}

/// Acknowledgement returned once the relay has queued a message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelayReceipt {
    pub id: String,
}

/// Errors produced while talking to the relay.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("failed to build url: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("relay responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
}

async fn parse_json<T>(response: Response) -> Result<T, MailError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<unavailable>"));
        return Err(MailError::Status { status, body });
    }
    Ok(response.json().await?)
}

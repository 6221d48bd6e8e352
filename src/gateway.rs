//! WhatsApp messaging gateway client.
//!
//! Speaks the Twilio Messages API: basic-auth, form-encoded POST of
//! From/To/Body, JSON receipt back. One call per message; no retries —
//! callers decide whether a failed send aborts the request or is
//! captured as a partial result.

use serde::Deserialize;

use crate::config::Config;

/// Delivery receipt returned by the gateway on a successful send.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageReceipt {
    pub sid: String,
    pub status: String,
}

/// Error body the gateway returns on a rejected send.
#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    code: Option<i64>,
    message: Option<String>,
    more_info: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Cannot reach messaging gateway at {0}")]
    Connection(String),

    #[error("Gateway request failed: {0}")]
    Http(String),

    #[error("Gateway rejected message: {message}")]
    Rejected {
        status: u16,
        code: Option<i64>,
        message: String,
        more_info: Option<String>,
    },
}

/// HTTP client for the messaging gateway. Constructed once at startup
/// from configuration and shared across requests.
pub struct WhatsAppClient {
    base_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
    client: reqwest::Client,
}

impl WhatsAppClient {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: config.twilio_api_base.trim_end_matches('/').to_string(),
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            from_number: config.twilio_whatsapp_number.clone(),
            client,
        }
    }

    /// First characters of the account SID, for diagnostic output.
    pub fn account_sid_prefix(&self) -> String {
        self.account_sid.chars().take(10).collect()
    }

    pub fn from_number(&self) -> &str {
        &self.from_number
    }

    /// Send one WhatsApp message. `to` is an E.164-ish number; a missing
    /// leading `+` is added before addressing.
    pub async fn send_whatsapp(
        &self,
        to: &str,
        body: &str,
    ) -> Result<MessageReceipt, GatewayError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );

        let to_addr = format!("whatsapp:{}", normalize_number(to));
        let from_addr = format!("whatsapp:{}", self.from_number);
        let form = [("From", from_addr.as_str()), ("To", to_addr.as_str()), ("Body", body)];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    GatewayError::Connection(self.base_url.clone())
                } else {
                    GatewayError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body: GatewayErrorBody = response.json().await.unwrap_or(GatewayErrorBody {
                code: None,
                message: None,
                more_info: None,
            });
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                code: body.code,
                message: body
                    .message
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
                more_info: body.more_info,
            });
        }

        let receipt: MessageReceipt = response
            .json()
            .await
            .map_err(|e| GatewayError::Http(format!("Invalid gateway response: {e}")))?;

        tracing::info!(sid = %receipt.sid, status = %receipt.status, "WhatsApp message sent");
        Ok(receipt)
    }
}

/// Ensure a leading `+` so the number is E.164-shaped.
pub fn normalize_number(number: &str) -> String {
    if number.starts_with('+') {
        number.to_string()
    } else {
        format!("+{number}")
    }
}

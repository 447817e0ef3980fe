use anyhow::{Result, anyhow};
use async_trait::async_trait;
use claims_core::config::{DeliveryConfig, DEFAULT_TWILIO_API_URL};
use serde::Deserialize;

use crate::channel::{DeliveryChannel, OutboundMessage};

#[derive(Debug, Deserialize)]
struct TwilioMessageResponse {
    sid: String,
}

struct TwilioAccount {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    messages_url: String,
}

/// SMS delivery through the Twilio Messages REST API.
pub struct SmsDelivery {
    account: Option<TwilioAccount>,
}

impl SmsDelivery {
    pub fn new(config: &DeliveryConfig) -> Result<Self> {
        if !config.sms_enabled() {
            tracing::warn!("SMS delivery disabled (missing or invalid Twilio configuration)");
            return Ok(Self { account: None });
        }

        let (Some(account_sid), Some(auth_token), Some(from_number)) = (
            &config.twilio_account_sid,
            &config.twilio_auth_token,
            &config.twilio_phone_number,
        ) else {
            return Ok(Self { account: None });
        };

        let client = reqwest::Client::builder()
            .timeout(config.sms_timeout())
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        let base = config
            .twilio_api_url
            .as_deref()
            .unwrap_or(DEFAULT_TWILIO_API_URL)
            .trim_end_matches('/');

        tracing::info!("Twilio SMS delivery enabled (from {})", from_number);
        Ok(Self {
            account: Some(TwilioAccount {
                client,
                account_sid: account_sid.clone(),
                auth_token: auth_token.clone(),
                from_number: from_number.clone(),
                messages_url: format!("{}/Accounts/{}/Messages.json", base, account_sid),
            }),
        })
    }
}

#[async_trait]
impl DeliveryChannel for SmsDelivery {
    fn name(&self) -> &'static str {
        "sms"
    }

    fn is_configured(&self) -> bool {
        self.account.is_some()
    }

    async fn send(&self, to: &str, message: &OutboundMessage) -> Result<()> {
        let Some(account) = &self.account else {
            tracing::debug!("SMS not configured, skipping SMS notification");
            return Ok(());
        };

        let form = [
            ("To", to),
            ("From", account.from_number.as_str()),
            ("Body", message.text.as_str()),
        ];

        let response = account
            .client
            .post(&account.messages_url)
            .basic_auth(&account.account_sid, Some(&account.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to send HTTP request to Twilio: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(
                "Twilio API returned error status {}: {}",
                status,
                error_text
            ));
        }

        let sent: TwilioMessageResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse Twilio API response: {}", e))?;

        tracing::info!("SMS sent to {} (message_sid: {})", to, sent.sid);
        Ok(())
    }
}

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use claims_core::config::{DeliveryConfig, DEFAULT_RESEND_API_URL};
use serde::{Deserialize, Serialize};

use crate::channel::{DeliveryChannel, OutboundMessage};

#[derive(Debug, Serialize)]
struct ResendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ResendEmailResponse {
    id: String,
}

struct ResendAccount {
    client: reqwest::Client,
    api_key: String,
    from_email: String,
    api_url: String,
}

/// Email delivery through the Resend HTTP API.
pub struct EmailDelivery {
    account: Option<ResendAccount>,
}

impl EmailDelivery {
    pub fn new(config: &DeliveryConfig) -> Result<Self> {
        if !config.email_enabled() {
            tracing::warn!("Email delivery disabled (missing Resend configuration)");
            return Ok(Self { account: None });
        }

        let (Some(api_key), Some(from_email)) =
            (&config.resend_api_key, &config.resend_from_email)
        else {
            return Ok(Self { account: None });
        };

        let client = reqwest::Client::builder()
            .timeout(config.email_timeout())
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        tracing::info!("Resend email delivery enabled (from {})", from_email);
        Ok(Self {
            account: Some(ResendAccount {
                client,
                api_key: api_key.clone(),
                from_email: from_email.clone(),
                api_url: config
                    .resend_api_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_RESEND_API_URL.to_string()),
            }),
        })
    }
}

#[async_trait]
impl DeliveryChannel for EmailDelivery {
    fn name(&self) -> &'static str {
        "email"
    }

    fn is_configured(&self) -> bool {
        self.account.is_some()
    }

    async fn send(&self, to: &str, message: &OutboundMessage) -> Result<()> {
        let Some(account) = &self.account else {
            tracing::debug!("Email not configured, skipping email notification");
            return Ok(());
        };

        let request = ResendEmailRequest {
            from: &account.from_email,
            to: vec![to],
            subject: &message.subject,
            html: wrap_html(&message.html),
            text: Some(&message.text),
        };

        let response = account
            .client
            .post(&account.api_url)
            .bearer_auth(&account.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to send HTTP request to Resend: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(
                "Resend API returned error status {}: {}",
                status,
                error_text
            ));
        }

        let sent: ResendEmailResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse Resend API response: {}", e))?;

        tracing::info!("Email sent to {}: {} (email_id: {})", to, message.subject, sent.id);
        Ok(())
    }
}

fn wrap_html(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
{}
    <p style="font-size: 14px; color: #6c757d; margin-top: 20px;">
        This is an automated notification from the damage claims tracker.
    </p>
</body>
</html>"#,
        body
    )
}

use anyhow::Result;
use claims_core::config::DeliveryConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::channel::{DeliveryChannel, OutboundMessage};
use crate::email::EmailDelivery;
use crate::sms::SmsDelivery;

/// Fire-and-forget front for the email and SMS channels.
///
/// Every dispatch runs on its own task bounded by the channel timeout. Failures
/// and timeouts are logged inside that task and never reach the caller. The
/// returned handle exists for tests; production callers drop it.
#[derive(Clone)]
pub struct Dispatcher {
    email: Arc<dyn DeliveryChannel>,
    sms: Arc<dyn DeliveryChannel>,
    email_timeout: Duration,
    sms_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        email: Arc<dyn DeliveryChannel>,
        sms: Arc<dyn DeliveryChannel>,
        email_timeout: Duration,
        sms_timeout: Duration,
    ) -> Self {
        Self {
            email,
            sms,
            email_timeout,
            sms_timeout,
        }
    }

    pub fn from_config(config: &DeliveryConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(EmailDelivery::new(config)?),
            Arc::new(SmsDelivery::new(config)?),
            config.email_timeout(),
            config.sms_timeout(),
        ))
    }

    pub fn dispatch_email(&self, to: &str, message: &Arc<OutboundMessage>) -> Option<JoinHandle<()>> {
        spawn_delivery(self.email.clone(), to, message.clone(), self.email_timeout)
    }

    pub fn dispatch_sms(&self, to: &str, message: &Arc<OutboundMessage>) -> Option<JoinHandle<()>> {
        spawn_delivery(self.sms.clone(), to, message.clone(), self.sms_timeout)
    }
}

fn spawn_delivery(
    channel: Arc<dyn DeliveryChannel>,
    target: &str,
    message: Arc<OutboundMessage>,
    limit: Duration,
) -> Option<JoinHandle<()>> {
    if !channel.is_configured() {
        tracing::debug!("{} not configured, skipping {} notification", channel.name(), channel.name());
        return None;
    }

    let target = target.to_string();
    Some(tokio::spawn(async move {
        match tokio::time::timeout(limit, channel.send(&target, &message)).await {
            Ok(Ok(())) => {
                tracing::debug!("{} delivered to {}: {}", channel.name(), target, message.subject);
            }
            Ok(Err(e)) => {
                tracing::error!("Error sending {} to {}: {}", channel.name(), target, e);
            }
            Err(_) => {
                tracing::warn!(
                    "{} to {} timed out after {:?}, dropping",
                    channel.name(),
                    target,
                    limit
                );
            }
        }
    }))
}

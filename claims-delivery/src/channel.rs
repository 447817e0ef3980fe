use async_trait::async_trait;

/// Rendered content for one recipient. Each channel picks the parts it can carry:
/// email sends `subject` + `html`, SMS sends `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// A delivery transport such as email or SMS.
///
/// `send` may fail; callers go through [`crate::Dispatcher`], which runs it in the
/// background and swallows the outcome.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    fn name(&self) -> &'static str;

    /// `false` when credentials are absent; dispatching to an unconfigured
    /// channel is a silent no-op.
    fn is_configured(&self) -> bool;

    async fn send(&self, target: &str, message: &OutboundMessage) -> anyhow::Result<()>;
}

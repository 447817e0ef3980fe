use chrono::{DateTime, FixedOffset, Utc};
use claims_core::types::{NewNotification, NotificationType, User};
use claims_core::{ClaimsContext, Stores};
use claims_delivery::Dispatcher;
use serde::Serialize;
use std::sync::Arc;

use crate::templates::{Rendered, Templates};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Records in-app notifications and hands email/SMS delivery to the dispatcher.
///
/// Cheap to clone; the scheduler and the HTTP layer each hold their own copy.
/// No mutable state lives here, so concurrent scans only share the stores.
#[derive(Clone)]
pub struct NotificationService {
    pub(crate) stores: Stores,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) templates: Templates,
    pub(crate) offset: FixedOffset,
    clock: Clock,
}

/// Outcome of delivering one rendered notification to a recipient set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FanOutSummary {
    pub recorded: usize,
    /// Recipients whose notification record could not be written.
    pub failed: usize,
    pub emails_dispatched: usize,
    pub sms_dispatched: usize,
}

impl NotificationService {
    pub fn new(stores: Stores, dispatcher: Dispatcher, templates: Templates, offset: FixedOffset) -> Self {
        Self {
            stores,
            dispatcher,
            templates,
            offset,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn from_context(ctx: &ClaimsContext, dispatcher: Dispatcher) -> Self {
        let offset = ctx.config.reminders.reference_offset();
        let templates = Templates::new(ctx.config.reminders.frontend_url.clone(), offset);
        Self::new(ctx.stores(), dispatcher, templates, offset)
    }

    /// Replaces the wall clock used for scans and record timestamps.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Persists one notification per recipient, then dispatches email and, for
    /// recipients with a phone number, SMS. Delivery is never awaited.
    ///
    /// Recipients are independent: a failed insert is logged and counted, and
    /// that recipient's email and SMS are still dispatched.
    pub(crate) async fn fan_out(
        &self,
        recipients: &[User],
        report_id: &str,
        kind: NotificationType,
        rendered: &Rendered,
        created_at: DateTime<Utc>,
    ) -> FanOutSummary {
        let outbound = Arc::new(rendered.outbound());
        let mut summary = FanOutSummary::default();

        for recipient in recipients {
            let inserted = self
                .stores
                .notifications
                .insert(NewNotification {
                    user_id: recipient.id.clone(),
                    damage_report_id: Some(report_id.to_string()),
                    notification_type: kind,
                    title: rendered.title.clone(),
                    message: rendered.message.clone(),
                    created_at,
                    scheduled_for: None,
                })
                .await;
            match inserted {
                Ok(_) => summary.recorded += 1,
                Err(e) => {
                    tracing::error!(
                        "Error recording {} notification for user {} on report {}: {}",
                        kind,
                        recipient.id,
                        report_id,
                        e
                    );
                    summary.failed += 1;
                }
            }

            if self.dispatcher.dispatch_email(&recipient.email, &outbound).is_some() {
                summary.emails_dispatched += 1;
            }

            if let Some(phone) = recipient.phone.as_deref() {
                if self.dispatcher.dispatch_sms(phone, &outbound).is_some() {
                    summary.sms_dispatched += 1;
                }
            }
        }

        tracing::debug!(
            "Recorded {} {} notifications for report {} ({} failed)",
            summary.recorded,
            kind,
            report_id,
            summary.failed
        );

        summary
    }
}

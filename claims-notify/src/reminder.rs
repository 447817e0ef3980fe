use anyhow::Result;
use chrono::{DateTime, Utc};
use claims_core::types::{DamageReport, CLAIM_HANDLER_ROLES};
use serde::Serialize;

use crate::policy::{due_reminders, DayWindow};
use crate::service::NotificationService;

/// Counts reported by one reminder scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub reports_checked: usize,
    /// Deadline tracks notified in this scan.
    pub reminders_sent: usize,
    /// Deadline tracks skipped because a reminder of the same type already exists today.
    pub reminders_skipped: usize,
    pub invalid_reports: usize,
    pub notifications_recorded: usize,
    /// Recipients whose reminder record could not be written.
    pub notifications_failed: usize,
    pub emails_dispatched: usize,
    pub sms_dispatched: usize,
}

impl NotificationService {
    pub async fn check_and_send_reminders(&self) -> Result<ScanSummary> {
        self.check_and_send_reminders_at(self.now()).await
    }

    /// Runs one reminder scan as of `now`.
    ///
    /// A failed candidate, recipient or de-duplication read aborts the scan and
    /// is returned. Malformed reports are logged and skipped, and a failed
    /// insert only loses that one recipient's record. All de-duplication state is read from the
    /// notification store, so overlapping scans are safe apart from the narrow
    /// window between one scan's check and its insert.
    pub async fn check_and_send_reminders_at(&self, now: DateTime<Utc>) -> Result<ScanSummary> {
        let window = DayWindow::containing(now, self.offset);

        let candidates = self.stores.reports.find_reports_with_upcoming_deadlines(now).await?;
        let recipients = self.stores.users.find_active_users_by_role(CLAIM_HANDLER_ROLES).await?;

        let mut summary = ScanSummary {
            reports_checked: candidates.len(),
            ..Default::default()
        };

        for record in candidates {
            let report = match DamageReport::try_from(record) {
                Ok(report) => report,
                Err(e) => {
                    tracing::warn!("Skipping damage report: {}", e);
                    summary.invalid_reports += 1;
                    continue;
                }
            };

            for due in due_reminders(&report, &window) {
                let already_sent = self
                    .stores
                    .notifications
                    .exists_for_report_type_today(&report.id, due.kind, window.today_start)
                    .await?;
                if already_sent {
                    tracing::debug!("{} for report {} already sent today", due.kind, report.id);
                    summary.reminders_skipped += 1;
                    continue;
                }

                let rendered = self.templates.reminder(&report, &due);
                let fan_out = self.fan_out(&recipients, &report.id, due.kind, &rendered, now).await;

                summary.reminders_sent += 1;
                summary.notifications_recorded += fan_out.recorded;
                summary.notifications_failed += fan_out.failed;
                summary.emails_dispatched += fan_out.emails_dispatched;
                summary.sms_dispatched += fan_out.sms_dispatched;
            }
        }

        tracing::info!(
            "Checked {} damage reports for reminders ({} sent, {} skipped, {} invalid, {} unrecorded)",
            summary.reports_checked,
            summary.reminders_sent,
            summary.reminders_skipped,
            summary.invalid_reports,
            summary.notifications_failed
        );

        Ok(summary)
    }
}

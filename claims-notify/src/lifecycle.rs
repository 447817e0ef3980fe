use anyhow::Result;
use claims_core::types::{DamageReport, NotificationType, ReportStatus, CLAIM_HANDLER_ROLES};

use crate::service::{FanOutSummary, NotificationService};

impl NotificationService {
    /// Tells every active claim handler about a newly persisted report.
    ///
    /// Returns once the notification records exist; email and SMS continue in
    /// the background. Failures are logged, never returned.
    pub async fn notify_new_damage_report(&self, report_id: &str) -> FanOutSummary {
        match self.try_notify_new_damage_report(report_id).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!("Error notifying new damage report {}: {}", report_id, e);
                FanOutSummary::default()
            }
        }
    }

    /// Tells the original reporter that their report changed status. Reports
    /// whose reporter could not be loaded are skipped with a warning.
    pub async fn notify_status_update(
        &self,
        report_id: &str,
        status: ReportStatus,
    ) -> FanOutSummary {
        match self.try_notify_status_update(report_id, status).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!("Error notifying status update for {}: {}", report_id, e);
                FanOutSummary::default()
            }
        }
    }

    async fn try_notify_new_damage_report(&self, report_id: &str) -> Result<FanOutSummary> {
        let Some(report) = self.load_report(report_id).await? else {
            return Ok(FanOutSummary::default());
        };

        let recipients = self.stores.users.find_active_users_by_role(CLAIM_HANDLER_ROLES).await?;
        let rendered = self.templates.new_report(&report);
        let summary = self
            .fan_out(
                &recipients,
                &report.id,
                NotificationType::NewDamageReport,
                &rendered,
                self.now(),
            )
            .await;

        tracing::info!(
            "Notified {} claim handlers of new damage report {}",
            summary.recorded,
            report.id
        );
        Ok(summary)
    }

    async fn try_notify_status_update(
        &self,
        report_id: &str,
        status: ReportStatus,
    ) -> Result<FanOutSummary> {
        let Some(report) = self.load_report(report_id).await? else {
            return Ok(FanOutSummary::default());
        };
        let Some(reporter) = report.reporter.clone() else {
            tracing::warn!("Damage report {} has no reporter, status update not sent", report.id);
            return Ok(FanOutSummary::default());
        };

        let rendered = self.templates.status_update(&report, status);
        let summary = self
            .fan_out(
                std::slice::from_ref(&reporter),
                &report.id,
                NotificationType::StatusUpdate,
                &rendered,
                self.now(),
            )
            .await;

        tracing::info!("Notified reporter {} of status {} on {}", reporter.id, status, report.id);
        Ok(summary)
    }

    async fn load_report(&self, report_id: &str) -> Result<Option<DamageReport>> {
        let Some(record) = self.stores.reports.find_report_by_id(report_id).await? else {
            tracing::warn!("Damage report {} not found, no notification sent", report_id);
            return Ok(None);
        };
        Ok(Some(DamageReport::try_from(record)?))
    }
}

#[cfg(test)]
mod tests {
    use crate::service::FanOutSummary;
    use crate::testing::{harness, record_with_damage_date, user, utc};
    use claims_core::types::{NotificationType, ReportStatus, Role};
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_new_report_notifies_claim_handlers() {
        let h = harness();
        h.store.add_user(user("u1", Role::ClaimTeam, Some("+15550000001")));
        h.store.add_user(user("u2", Role::Admin, None));
        h.store.add_user(user("u3", Role::Cleaner, Some("+15550000003")));
        h.store.add_report(record_with_damage_date("r1", utc(2024, 1, 1, 0, 0)));

        let summary = h.service.notify_new_damage_report("r1").await;

        assert_eq!(summary.recorded, 2);
        assert_eq!(summary.emails_dispatched, 2);
        assert_eq!(summary.sms_dispatched, 1);

        let rows = h.store.notifications();
        assert!(rows.iter().all(|n| n.notification_type == NotificationType::NewDamageReport));
        assert!(rows.iter().all(|n| !n.is_read));
        assert_eq!(
            rows[0].message,
            "New damage reported at Seaside Loft (Multiple items) by Casey Cleaner. Deadline: 01/15/2024"
        );

        h.email.wait_for(2).await;
        assert_eq!(h.email.subjects(), vec!["New Damage Report", "New Damage Report"]);
    }

    #[tokio::test]
    async fn test_new_report_returns_before_hanging_email() {
        let h = harness();
        h.email.hang(true);
        for i in 0..3 {
            h.store.add_user(user(&format!("u{i}"), Role::ClaimTeam, None));
        }
        h.store.add_report(record_with_damage_date("r1", utc(2024, 1, 1, 0, 0)));

        let started = Instant::now();
        let summary = h.service.notify_new_damage_report("r1").await;

        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(summary.recorded, 3);
        assert_eq!(h.store.notifications().len(), 3);
        assert_eq!(h.email.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_status_update_goes_to_reporter_only() {
        let h = harness();
        h.store.add_user(user("u1", Role::ClaimTeam, Some("+15550000001")));
        let mut record = record_with_damage_date("r1", utc(2024, 1, 1, 0, 0));
        if let Some(reporter) = record.reporter.as_mut() {
            reporter.phone = Some("+15550009999".to_string());
        }
        h.store.add_report(record);

        let summary = h.service.notify_status_update("r1", ReportStatus::Approved).await;

        assert_eq!(summary.recorded, 1);
        assert_eq!(summary.sms_dispatched, 1);
        let rows = h.store.notifications();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, "reporter-1");
        assert_eq!(rows[0].notification_type, NotificationType::StatusUpdate);
        assert_eq!(
            rows[0].message,
            "Status updated for damage at Seaside Loft (Multiple items): APPROVED"
        );

        h.sms.wait_for(1).await;
        assert_eq!(h.sms.targets(), vec!["+15550009999"]);
    }

    #[tokio::test]
    async fn test_missing_report_is_silent() {
        let h = harness();
        h.store.add_user(user("u1", Role::ClaimTeam, None));

        assert_eq!(h.service.notify_new_damage_report("nope").await.recorded, 0);
        let status = h.service.notify_status_update("nope", ReportStatus::Resolved).await;
        assert_eq!(status.recorded, 0);
        assert!(h.store.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let h = harness();
        h.store.add_user(user("u1", Role::ClaimTeam, None));
        h.store.add_report(record_with_damage_date("r1", utc(2024, 1, 1, 0, 0)));
        h.store.fail_reads(true);

        let summary = h.service.notify_new_damage_report("r1").await;
        assert_eq!(summary, FanOutSummary::default());
        assert_eq!(h.email.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_inserts_still_email() {
        let h = harness();
        h.store.add_user(user("u1", Role::ClaimTeam, None));
        h.store.add_report(record_with_damage_date("r1", utc(2024, 1, 1, 0, 0)));
        h.store.fail_writes(true);

        let summary = h.service.notify_new_damage_report("r1").await;
        assert_eq!(summary.recorded, 0);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.emails_dispatched, 1);
        h.email.wait_for(1).await;
    }

    #[tokio::test]
    async fn test_partial_insert_failure_reports_what_was_recorded() {
        let h = harness();
        for i in 1..=3 {
            h.store.add_user(user(&format!("u{i}"), Role::ClaimTeam, None));
        }
        h.store.add_report(record_with_damage_date("r1", utc(2024, 1, 1, 0, 0)));
        h.store.fail_insert_once(1);

        let summary = h.service.notify_new_damage_report("r1").await;

        assert_eq!(summary.recorded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.emails_dispatched, 3);
        let users: Vec<String> = h.store.notifications().into_iter().map(|n| n.user_id).collect();
        assert_eq!(users, vec!["u2", "u3"]);
    }

    #[tokio::test]
    async fn test_status_update_without_reporter_is_skipped() {
        let h = harness();
        let mut record = record_with_damage_date("r1", utc(2024, 1, 1, 0, 0));
        record.reporter = None;
        h.store.add_report(record);

        let summary = h.service.notify_status_update("r1", ReportStatus::Approved).await;

        assert_eq!(summary, FanOutSummary::default());
        assert!(h.store.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_new_report_without_reporter_still_notifies() {
        let h = harness();
        h.store.add_user(user("u1", Role::ClaimTeam, None));
        let mut record = record_with_damage_date("r1", utc(2024, 1, 1, 0, 0));
        record.reporter = None;
        h.store.add_report(record);

        let summary = h.service.notify_new_damage_report("r1").await;

        assert_eq!(summary.recorded, 1);
        assert!(h.store.notifications()[0].message.contains("by Unknown reporter."));
    }
}

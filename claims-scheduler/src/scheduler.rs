//! Periodic trigger for the reminder scan.

use anyhow::{anyhow, Result};
use claims_notify::NotificationService;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

/// Runs the reminder scan on a cron schedule.
///
/// Each tick calls the same scan as the manual trigger; a failed scan is
/// logged and retried naturally on the next tick.
pub struct ReminderScheduler {
    scheduler: JobScheduler,
}

impl std::fmt::Debug for ReminderScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReminderScheduler").finish()
    }
}

impl ReminderScheduler {
    pub async fn new() -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| anyhow!("Failed to create scheduler: {}", e))?;

        Ok(Self { scheduler })
    }

    /// Registers the reminder scan under a six-field cron expression
    /// (seconds first), e.g. `0 0 * * * *` for the top of every hour.
    pub async fn register(&self, schedule: &str, service: NotificationService) -> Result<()> {
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let service = service.clone();
            Box::pin(async move {
                tracing::debug!("Running scheduled reminder check");
                if let Err(e) = service.check_and_send_reminders().await {
                    tracing::error!("Error checking reminders: {}", e);
                }
            })
        })
        .map_err(|e| anyhow!("Invalid reminder schedule {:?}: {}", schedule, e))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to add reminder schedule: {}", e))?;

        tracing::info!("Registered reminder check ({})", schedule);
        Ok(())
    }

    pub async fn start(&self) -> Result<()> {
        self.scheduler
            .start()
            .await
            .map_err(|e| anyhow!("Failed to start scheduler: {}", e))?;

        tracing::info!("Reminder scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| anyhow!("Failed to shut down scheduler: {}", e))?;

        tracing::info!("Reminder scheduler shut down");
        Ok(())
    }
}

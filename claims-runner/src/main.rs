use anyhow::Result;
use claims_api::AppState;
use claims_core::{ClaimsContext, Config};
use claims_delivery::Dispatcher;
use claims_notify::NotificationService;
use claims_scheduler::ReminderScheduler;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting damage claims notification service");

    let config = Config::from_env();
    let ctx = ClaimsContext::new(config).await?;

    tracing::info!("Claims context initialized");

    let dispatcher = Dispatcher::from_config(&ctx.config.delivery)?;
    let notifier = NotificationService::from_context(&ctx, dispatcher);

    let mut scheduler = ReminderScheduler::new().await?;
    scheduler
        .register(&ctx.config.reminders.schedule, notifier.clone())
        .await?;
    scheduler.start().await?;

    // API server runs in main task until Ctrl-C
    let served = claims_api::run(AppState::new(&ctx, notifier), &ctx.config.server).await;

    if let Err(e) = scheduler.shutdown().await {
        tracing::error!("Error stopping reminder scheduler: {}", e);
    }

    served
}

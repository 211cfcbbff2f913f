//! One-shot run of the daily suspension sweep, for cron or manual recovery.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use staffdesk_backend::{
    config::Config, db::create_pool, services::sweep::run_daily_sweep, state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staffdesk_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let pool = create_pool(&config.database_url).await?;
    let state = AppState::new(pool, config);

    let (expired, scheduled) = run_daily_sweep(&state)
        .await
        .map_err(|err| anyhow::anyhow!("suspension sweep failed: {}", err))?;

    tracing::info!(
        checked = expired.checked,
        restored = expired.restored,
        pending = expired.pending_penalizations,
        "Expired suspensions processed"
    );
    tracing::info!(
        checked = scheduled.checked,
        activated = scheduled.activated,
        discarded = scheduled.discarded,
        "Scheduled suspensions processed"
    );

    Ok(())
}

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use staffdesk_backend::{
    config::Config,
    db::{create_pool, run_migrations},
    routes::build_router,
    services::sweep::spawn_daily_sweep,
    state::AppState,
};

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staffdesk_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        jwt_secret = %mask_secret(&config.jwt_secret),
        jwt_expiration_hours = config.jwt_expiration_hours,
        time_zone = %config.time_zone,
        bind_addr = %config.bind_addr,
        sweep_enabled = config.sweep_enabled,
        sweep_hour = config.sweep_hour,
        "Loaded configuration from environment/.env"
    );

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(pool, config);

    if state.config.sweep_enabled {
        spawn_daily_sweep(state.clone());
    } else {
        tracing::info!("Daily suspension sweep disabled");
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

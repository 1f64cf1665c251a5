use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up SITE_URL, SECURITY_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = moto_shop_portal::config::config();
    tracing::info!("Starting notification functions in {:?} mode", config.environment);
    if moto_shop_portal::is_development!() && !config.security.require_auth {
        tracing::warn!("Function auth is disabled");
    }

    moto_shop_portal::server::serve(config.functions.port).await
}

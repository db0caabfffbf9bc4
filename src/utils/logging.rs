use tracing_subscriber::EnvFilter;

/// Logs sur stdout. RUST_LOG surcharge le filtre par défaut.
/// Les logs du crate `log` (middleware::Logger d'actix, sqlx) passent par le pont tracing-log.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,sea_orm=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

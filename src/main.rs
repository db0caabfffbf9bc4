mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;
#[cfg(test)]
mod test_support;

use actix_web::{App, HttpServer, middleware::Logger};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::routes::AppState;
use crate::services::cleanup_service::CleanupService;
use crate::services::mail_service::{Notifier, SmtpMailer};
use crate::services::media_service::{CloudinaryStore, MediaStore};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    utils::logging::init_logging();

    let config = AppConfig::from_env().map_err(io::Error::other)?;

    tracing::info!("connecting to database");
    let db = db::establish_connection(&config.database_url)
        .await
        .map_err(io::Error::other)?;
    db::sync_schema(&db).await.map_err(io::Error::other)?;
    tracing::info!("database connected");

    // Clients externes créés une seule fois puis partagés par tous les workers
    let media: Arc<dyn MediaStore> = Arc::new(CloudinaryStore::new(config.cloud.clone()));
    let mailer = SmtpMailer::new(&config.mail).map_err(io::Error::other)?;
    let notifier = Notifier::new(Arc::new(mailer), config.mail.sign_in_url.clone());

    CleanupService::spawn(db.clone(), Duration::from_secs(config.cleanup_interval_secs));

    let bind = (config.host.clone(), config.port);
    let state = AppState::new(db, media, notifier, config);

    tracing::info!(host = %bind.0, port = bind.1, "starting server");

    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(Logger::default())
            .configure(move |cfg| state.register(cfg))
            .configure(routes::configure_routes)
    })
    .bind(bind)?
    .run()
    .await
}

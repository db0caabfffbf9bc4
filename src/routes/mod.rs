pub mod audio;
pub mod auth;
pub mod favorite;
pub mod health;
pub mod history;
pub mod playlist;
pub mod profile;

use actix_multipart::form::MultipartFormConfig;
use actix_multipart::form::tempfile::TempFile;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, web};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::services::mail_service::Notifier;
use crate::services::media_service::{MediaKind, MediaStore, MediaUpload};

const MULTIPART_LIMIT: usize = 50 * 1024 * 1024;

/// Dépendances injectées dans les handlers via web::Data
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub media: Arc<dyn MediaStore>,
    pub notifier: Notifier,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        media: Arc<dyn MediaStore>,
        notifier: Notifier,
        config: AppConfig,
    ) -> Self {
        Self {
            db,
            media,
            notifier,
            config,
        }
    }

    /// Enregistre les dépendances + la conversion des erreurs d'extraction en 422
    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.db.clone()))
            .app_data(web::Data::from(self.media.clone()))
            .app_data(web::Data::new(self.notifier.clone()))
            .app_data(web::Data::new(self.config.clone()))
            .app_data(
                web::JsonConfig::default()
                    .error_handler(|err, _req| ApiError::validation(err.to_string()).into()),
            )
            .app_data(
                web::QueryConfig::default()
                    .error_handler(|err, _req| ApiError::validation(err.to_string()).into()),
            )
            .app_data(
                MultipartFormConfig::default()
                    .total_limit(MULTIPART_LIMIT)
                    .error_handler(|err, req| multipart_error(err.to_string(), req).into()),
            );
    }
}

fn multipart_error(message: String, req: &HttpRequest) -> ApiError {
    let is_form_data = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    if is_form_data {
        ApiError::validation(message)
    } else {
        ApiError::validation("Only accepts form-data!")
    }
}

/// Fichier multipart présent et non vide
pub(crate) fn provided(file: Option<TempFile>) -> Option<TempFile> {
    file.filter(|f| f.size > 0)
}

/// Lit le fichier temporaire reçu pour l'envoyer au MediaStore
pub(crate) async fn read_upload(file: &TempFile, kind: MediaKind) -> Result<MediaUpload, ApiError> {
    let bytes = tokio::fs::read(file.file.path())
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to read upload: {}", e)))?;

    Ok(MediaUpload {
        bytes,
        file_name: file.file_name.clone().unwrap_or_else(|| "upload".to_string()),
        kind,
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health_check)
        .configure(auth::auth_routes)
        .configure(audio::audio_routes)
        .configure(favorite::favorite_routes)
        .configure(playlist::playlist_routes)
        .configure(history::history_routes)
        .configure(profile::profile_routes);
}

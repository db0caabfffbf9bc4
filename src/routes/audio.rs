use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};
use actix_web::{HttpResponse, get, patch, post, web};
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::VerifiedUser;
use crate::middleware::validator::{parse_id, validate};
use crate::models::dto::{AudioFields, AudioResponse};
use crate::routes::{provided, read_upload};
use crate::services::audio_service::AudioService;
use crate::services::media_service::{MediaKind, MediaStore, remove_quietly};

#[derive(MultipartForm)]
pub struct AudioForm {
    pub title: Option<Text<String>>,
    pub about: Option<Text<String>>,
    pub category: Option<Text<String>>,
    pub file: Option<TempFile>,
    pub poster: Option<TempFile>,
}

fn text(field: Option<Text<String>>) -> String {
    field
        .map(|value| value.into_inner().trim().to_string())
        .unwrap_or_default()
}

impl AudioForm {
    /// Sépare les champs texte (validés) des fichiers
    fn split(self) -> Result<(AudioFields, Option<TempFile>, Option<TempFile>), ApiError> {
        let fields = AudioFields {
            title: text(self.title),
            about: text(self.about),
            category: text(self.category),
        };
        validate(&fields)?;

        Ok((fields, provided(self.file), provided(self.poster)))
    }
}

/// POST /audio/create - Upload d'un audio (email vérifié, multipart)
#[post("/create")]
pub async fn create_audio(
    user: VerifiedUser,
    MultipartForm(form): MultipartForm<AudioForm>,
    db: web::Data<DatabaseConnection>,
    media: web::Data<dyn MediaStore>,
) -> Result<HttpResponse, ApiError> {
    let (fields, file, poster) = form.split()?;
    let file = file.ok_or_else(|| ApiError::validation("Audio file is missing!"))?;

    let file = media.upload(read_upload(&file, MediaKind::Audio).await?).await?;
    let poster = match poster {
        Some(poster) => Some(media.upload(read_upload(&poster, MediaKind::Poster).await?).await?),
        None => None,
    };

    let audio = AudioService::create(db.get_ref(), user.0.profile.id, &fields, file, poster).await?;

    Ok(HttpResponse::Created().json(json!({ "audio": AudioResponse::from_model(&audio) })))
}

/// PATCH /audio/{audioId} - Titre, description, catégorie et poster
/// Nouveau poster: upload, enregistrement, PUIS suppression de l'ancien
#[patch("/{audio_id}")]
pub async fn update_audio(
    user: VerifiedUser,
    path: web::Path<String>,
    MultipartForm(form): MultipartForm<AudioForm>,
    db: web::Data<DatabaseConnection>,
    media: web::Data<dyn MediaStore>,
) -> Result<HttpResponse, ApiError> {
    let (fields, _, poster) = form.split()?;
    let not_found = || ApiError::not_found("Record not found!");

    let audio_id = parse_id(&path, "Invalid audio id!").map_err(|_| not_found())?;
    let audio = AudioService::find_owned(db.get_ref(), user.0.profile.id, audio_id)
        .await?
        .ok_or_else(not_found)?;

    let new_poster = match poster {
        Some(poster) => Some(media.upload(read_upload(&poster, MediaKind::Poster).await?).await?),
        None => None,
    };

    let old_poster = audio.poster_public_id.clone();
    let replaced = new_poster.is_some();
    let audio = AudioService::update(db.get_ref(), audio, &fields, new_poster).await?;

    if let (true, Some(old)) = (replaced, old_poster) {
        remove_quietly(media.get_ref(), &old, MediaKind::Poster).await;
    }

    Ok(HttpResponse::Created().json(json!({ "audio": AudioResponse::from_model(&audio) })))
}

/// GET /audio/latest - 10 derniers uploads (PUBLIC)
#[get("/latest")]
pub async fn latest_uploads(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, ApiError> {
    let audios = AudioService::latest(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "audios": audios })))
}

pub fn audio_routes(cfg: &mut web::ServiceConfig) {
    // /latest avant /{audio_id}: sinon "latest" serait pris pour un id
    cfg.service(
        web::scope("/audio")
            .service(latest_uploads)
            .service(create_audio)
            .service(update_audio),
    );
}

use actix_web::{HttpResponse, get, post, web};
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::validator::parse_id;
use crate::middleware::{AuthUser, MaybeAuthUser};
use crate::services::audio_service::AudioService;
use crate::services::history_service::HistoryService;
use crate::services::playlist_service::PlaylistService;
use crate::services::profile_service::ProfileService;
use crate::utils::pagination::PaginationQuery;

const INVALID_PROFILE_ID: &str = "Invalid profile id!";

/// POST /profile/update-follower/{profileId} - Suivre / ne plus suivre
#[post("/update-follower/{profile_id}")]
pub async fn update_follower(
    user: AuthUser,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let profile_id = parse_id(&path, INVALID_PROFILE_ID)?;

    let status = ProfileService::toggle_follow(db.get_ref(), user.profile.id, profile_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "status": status })))
}

/// GET /profile/info/{profileId} - Profil public (PUBLIC)
#[get("/info/{profile_id}")]
pub async fn public_profile(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let profile_id = parse_id(&path, INVALID_PROFILE_ID)?;

    let profile = ProfileService::public_profile(db.get_ref(), profile_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "profile": profile })))
}

/// GET /profile/uploads/{profileId}?pageNo&limit - Audios publiés (PUBLIC)
#[get("/uploads/{profile_id}")]
pub async fn public_uploads(
    path: web::Path<String>,
    page: web::Query<PaginationQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let profile_id = parse_id(&path, INVALID_PROFILE_ID)?;

    let audios = AudioService::uploads_by(db.get_ref(), profile_id, &page).await?;

    Ok(HttpResponse::Ok().json(json!({ "audios": audios })))
}

/// GET /profile/playlist/{profileId}?pageNo&limit
/// Playlists publiques, plus les privées quand c'est le propriétaire qui demande
#[get("/playlist/{profile_id}")]
pub async fn public_playlists(
    user: MaybeAuthUser,
    path: web::Path<String>,
    page: web::Query<PaginationQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let profile_id = parse_id(&path, INVALID_PROFILE_ID)?;
    let is_owner = user.0.is_some_and(|user| user.profile.id == profile_id);

    let playlist = PlaylistService::by_owner(db.get_ref(), profile_id, is_owner, &page).await?;

    Ok(HttpResponse::Ok().json(json!({ "playlist": playlist })))
}

/// GET /profile/recommended - Audios les plus likés, personnalisés si connecté
#[get("/recommended")]
pub async fn recommended(
    user: MaybeAuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let categories = match &user.0 {
        Some(user) => HistoryService::listened_categories(db.get_ref(), user.profile.id).await?,
        None => Vec::new(),
    };

    let audios = AudioService::most_liked(db.get_ref(), &categories).await?;

    Ok(HttpResponse::Ok().json(json!({ "audios": audios })))
}

pub fn profile_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/profile")
            .service(update_follower)
            .service(public_profile)
            .service(public_uploads)
            .service(public_playlists)
            .service(recommended),
    );
}

use actix_web::{HttpResponse, delete, get, patch, post, web};
use sea_orm::DatabaseConnection;
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::validator::parse_id;
use crate::middleware::{AuthUser, ValidatedJson, VerifiedUser};
use crate::models::dto::{NewPlaylistRequest, OldPlaylistRequest, PlaylistInfo, RemovePlaylistQuery};
use crate::models::playlists::{self, Visibility};
use crate::services::playlist_service::PlaylistService;
use crate::utils::pagination::PaginationQuery;

fn info(playlist: playlists::Model) -> PlaylistInfo {
    PlaylistInfo {
        id: playlist.id,
        title: playlist.title,
        visibility: playlist.visibility,
    }
}

/// Les valeurs ont déjà passé validate_visibility
fn visibility(value: Option<&str>) -> Result<Option<Visibility>, ApiError> {
    value
        .map(|v| v.parse::<Visibility>().map_err(ApiError::Validation))
        .transpose()
}

fn optional_id(value: Option<&str>) -> Result<Option<Uuid>, ApiError> {
    value.map(|id| parse_id(id, "Invalid audio id!")).transpose()
}

/// POST /playlist/create - Nouvelle playlist, avec éventuellement un premier audio
#[post("/create")]
pub async fn create_playlist(
    user: VerifiedUser,
    body: ValidatedJson<NewPlaylistRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let audio_id = optional_id(body.audio_id.as_deref())?;
    let visibility = visibility(body.visibility.as_deref())?.unwrap_or(Visibility::Public);

    let playlist =
        PlaylistService::create(db.get_ref(), user.0.profile.id, &body.title, audio_id, visibility).await?;

    Ok(HttpResponse::Created().json(json!({ "playlist": info(playlist) })))
}

/// PATCH /playlist - Titre, visibilité, ajout d'un audio
#[patch("")]
pub async fn update_playlist(
    user: AuthUser,
    body: ValidatedJson<OldPlaylistRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let playlist_id = parse_id(&body.id, "Invalid playlist id!")?;
    let item = optional_id(body.item.as_deref())?;
    let visibility = visibility(body.visibility.as_deref())?;

    let playlist = PlaylistService::update(
        db.get_ref(),
        user.profile.id,
        playlist_id,
        &body.title,
        item,
        visibility,
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({ "playlist": info(playlist) })))
}

/// DELETE /playlist?playlistId=...&audioId=...&all=yes
/// all=yes supprime toute la playlist, sinon seul audioId est retiré
#[delete("")]
pub async fn remove_playlist(
    user: AuthUser,
    query: web::Query<RemovePlaylistQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let playlist_id = parse_id(&query.playlist_id, "Invalid playlist id!")?;

    if query.all.as_deref() == Some("yes") {
        PlaylistService::remove(db.get_ref(), user.profile.id, playlist_id).await?;
    } else if let Some(audio_id) = optional_id(query.audio_id.as_deref())? {
        PlaylistService::remove_item(db.get_ref(), user.profile.id, playlist_id, audio_id).await?;
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// GET /playlist/by-profile?pageNo=0&limit=20 - Playlists de l'utilisateur connecté
#[get("/by-profile")]
pub async fn playlists_by_profile(
    user: AuthUser,
    page: web::Query<PaginationQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let playlist = PlaylistService::by_owner(db.get_ref(), user.profile.id, true, &page).await?;
    Ok(HttpResponse::Ok().json(json!({ "playlist": playlist })))
}

/// GET /playlist/{playlistId} - Audios d'une playlist ({ list: [] } si absente)
#[get("/{playlist_id}")]
pub async fn playlist_audios(
    user: AuthUser,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let playlist_id = parse_id(&path, "Invalid playlist id!")?;

    match PlaylistService::audios_of(db.get_ref(), user.profile.id, playlist_id).await? {
        Some(list) => Ok(HttpResponse::Ok().json(json!({ "list": list }))),
        None => Ok(HttpResponse::Ok().json(json!({ "list": [] }))),
    }
}

pub fn playlist_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/playlist")
            .service(create_playlist)
            .service(update_playlist)
            .service(remove_playlist)
            .service(playlists_by_profile)
            .service(playlist_audios),
    );
}

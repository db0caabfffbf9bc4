use actix_web::{HttpResponse, delete, get, post, web};
use sea_orm::DatabaseConnection;
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::validator::{parse_client_date, parse_id};
use crate::middleware::{AuthUser, ValidatedJson};
use crate::models::dto::{RemoveHistoryQuery, UpdateHistoryRequest};
use crate::services::history_service::HistoryService;
use crate::utils::pagination::PaginationQuery;

/// histories=["id1","id2"] → liste d'UUID, 422 si le tableau est mal formé
fn parse_history_ids(raw: &str) -> Result<Vec<Uuid>, ApiError> {
    let invalid = || ApiError::validation("Invalid histories!");

    let ids: Vec<String> = serde_json::from_str(raw).map_err(|_| invalid())?;
    ids.iter()
        .map(|id| Uuid::parse_str(id.trim()).map_err(|_| invalid()))
        .collect()
}

/// POST /history - Enregistre la progression d'écoute
#[post("")]
pub async fn update_history(
    user: AuthUser,
    body: ValidatedJson<UpdateHistoryRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let audio_id = parse_id(&body.audio, "Invalid audio id!")?;
    let progress = body
        .progress
        .ok_or_else(|| ApiError::validation("History progress is missing!"))?;
    let date = parse_client_date(&body.date).ok_or_else(|| ApiError::validation("Invalid date!"))?;

    HistoryService::record(db.get_ref(), user.profile.id, audio_id, progress, date).await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// DELETE /history?histories=[...] ou ?all=yes
#[delete("")]
pub async fn remove_history(
    user: AuthUser,
    query: web::Query<RemoveHistoryQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let removed = if query.all.as_deref() == Some("yes") {
        HistoryService::remove_all(db.get_ref(), user.profile.id).await?
    } else {
        let ids = match query.histories.as_deref() {
            Some(raw) => parse_history_ids(raw)?,
            None => Vec::new(),
        };
        HistoryService::remove(db.get_ref(), user.profile.id, &ids).await?
    };

    tracing::debug!(user_id = %user.profile.id, removed, "history entries removed");
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// GET /history?pageNo=0&limit=20 - Historique groupé par jour
#[get("")]
pub async fn get_histories(
    user: AuthUser,
    page: web::Query<PaginationQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let histories = HistoryService::grouped(db.get_ref(), user.profile.id, &page).await?;
    Ok(HttpResponse::Ok().json(json!({ "histories": histories })))
}

/// GET /history/recently-played - 10 dernières écoutes
#[get("/recently-played")]
pub async fn recently_played(
    user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let audios = HistoryService::recently_played(db.get_ref(), user.profile.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "audios": audios })))
}

pub fn history_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/history")
            .service(update_history)
            .service(remove_history)
            .service(get_histories)
            .service(recently_played),
    );
}

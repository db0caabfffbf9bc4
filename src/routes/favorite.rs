use actix_web::{HttpResponse, get, post, web};
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::validator::parse_id;
use crate::middleware::{AuthUser, VerifiedUser};
use crate::models::dto::AudioIdQuery;
use crate::services::favorite_service::FavoriteService;
use crate::utils::pagination::PaginationQuery;

/// POST /favorite?audioId=... - Ajoute ou retire un audio des favoris (email vérifié)
#[post("")]
pub async fn toggle_favorite(
    user: VerifiedUser,
    query: web::Query<AudioIdQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let audio_id = parse_id(&query.audio_id, "Audio id is invalid!")?;

    let status = FavoriteService::toggle(db.get_ref(), user.0.profile.id, audio_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "status": status })))
}

/// GET /favorite?pageNo=0&limit=20 - Favoris paginés
#[get("")]
pub async fn get_favorites(
    user: AuthUser,
    page: web::Query<PaginationQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let audios = FavoriteService::list(db.get_ref(), user.profile.id, &page).await?;
    Ok(HttpResponse::Ok().json(json!({ "audios": audios })))
}

/// GET /favorite/is-fav?audioId=...
#[get("/is-fav")]
pub async fn is_favorite(
    user: AuthUser,
    query: web::Query<AudioIdQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let audio_id = parse_id(&query.audio_id, "Invalid audio id!")?;

    let result = FavoriteService::is_favorite(db.get_ref(), user.profile.id, audio_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "result": result })))
}

pub fn favorite_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/favorite")
            .service(toggle_favorite)
            .service(get_favorites)
            .service(is_favorite),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestContext, bearer, seed_audio, seed_user, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;

    #[actix_web::test]
    async fn test_toggle_add_then_remove() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);
        let (alice, token) = seed_user(&ctx.db, "Alice", "a@x.com", true).await;
        let audio = seed_audio(&ctx.db, alice.id, "Song", "Music").await;

        let toggle = || {
            test::TestRequest::post()
                .uri(&format!("/favorite?audioId={}", audio.id))
                .insert_header(bearer(&token))
                .to_request()
        };
        let is_fav = || {
            test::TestRequest::get()
                .uri(&format!("/favorite/is-fav?audioId={}", audio.id))
                .insert_header(bearer(&token))
                .to_request()
        };

        let body: serde_json::Value = test::call_and_read_body_json(&app, toggle()).await;
        assert_eq!(body["status"], "added");
        let body: serde_json::Value = test::call_and_read_body_json(&app, is_fav()).await;
        assert_eq!(body["result"], true);

        let req = test::TestRequest::get()
            .uri("/favorite")
            .insert_header(bearer(&token))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["audios"][0]["id"], audio.id.to_string());
        assert_eq!(body["audios"][0]["owner"]["name"], "Alice");

        let body: serde_json::Value = test::call_and_read_body_json(&app, toggle()).await;
        assert_eq!(body["status"], "removed");
        let body: serde_json::Value = test::call_and_read_body_json(&app, is_fav()).await;
        assert_eq!(body["result"], false);
    }

    #[actix_web::test]
    async fn test_toggle_rejects_bad_ids() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);
        let (_, token) = seed_user(&ctx.db, "Alice", "a@x.com", true).await;

        let req = test::TestRequest::post()
            .uri("/favorite?audioId=123")
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Audio id is invalid!");

        let req = test::TestRequest::post()
            .uri(&format!("/favorite?audioId={}", uuid::Uuid::new_v4()))
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_unverified_user_can_read_but_not_toggle() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);
        let (bob, token) = seed_user(&ctx.db, "Bob", "b@x.com", false).await;
        let audio = seed_audio(&ctx.db, bob.id, "Song", "Music").await;

        let req = test::TestRequest::post()
            .uri(&format!("/favorite?audioId={}", audio.id))
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/favorite?pageNo=0&limit=5")
            .insert_header(bearer(&token))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["audios"].as_array().unwrap().len(), 0);
    }

    #[actix_web::test]
    async fn test_oversized_page_is_clamped() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);
        let (alice, token) = seed_user(&ctx.db, "Alice", "a@x.com", true).await;
        let audio = seed_audio(&ctx.db, alice.id, "Song", "Music").await;
        FavoriteService::toggle(&ctx.db, alice.id, audio.id).await.unwrap();

        let req = test::TestRequest::get()
            .uri("/favorite?pageNo=0&limit=18446744073709551615")
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["audios"].as_array().unwrap().len(), 1);
    }
}

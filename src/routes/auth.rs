use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};
use actix_web::{HttpResponse, get, post, web};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::json;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::middleware::validator::parse_id;
use crate::middleware::{AuthUser, ValidatedJson};
use crate::models::dto::{
    CreateUserRequest, ForgetPasswordRequest, LogOutQuery, ReVerifyEmailRequest, SignInRequest,
    TokenRequest, UpdatePasswordRequest, UserCreated,
};
use crate::models::users;
use crate::routes::{provided, read_upload};
use crate::services::auth_service::AuthService;
use crate::services::mail_service::{MailKind, Notifier, Recipient};
use crate::services::media_service::{MediaKind, MediaStore, remove_quietly};
use crate::services::profile_service::ProfileService;

fn recipient(user: &users::Model) -> Recipient {
    Recipient {
        name: user.name.clone(),
        email: user.email.clone(),
    }
}

/// POST /auth/create - Créer un compte (PUBLIC)
/// Envoie l'OTP de vérification par email en tâche de fond
#[post("/create")]
pub async fn create_user(
    body: ValidatedJson<CreateUserRequest>,
    db: web::Data<DatabaseConnection>,
    notifier: web::Data<Notifier>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();

    let user = AuthService::create_user(db.get_ref(), &body.name, &body.email, &body.password).await?;
    let otp = AuthService::issue_verification_token(db.get_ref(), user.id).await?;

    notifier.send(MailKind::Verification { otp }, recipient(&user));

    Ok(HttpResponse::Created().json(json!({
        "user": UserCreated {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    })))
}

/// POST /auth/verify-email - Valider l'OTP reçu par email
#[post("/verify-email")]
pub async fn verify_email(
    body: ValidatedJson<TokenRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let user_id = parse_id(&body.0.user_id, "Invalid userId!")?;

    AuthService::consume_verification_token(db.get_ref(), user_id, &body.0.token).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Email verified successfully!" })))
}

/// POST /auth/re-verify-email - Renvoyer un nouvel OTP
#[post("/re-verify-email")]
pub async fn re_verify_email(
    body: web::Json<ReVerifyEmailRequest>,
    db: web::Data<DatabaseConnection>,
    notifier: web::Data<Notifier>,
) -> Result<HttpResponse, ApiError> {
    let invalid = || ApiError::auth("Invalid request!");

    let user_id = Uuid::parse_str(body.user_id.trim()).map_err(|_| invalid())?;
    let user = AuthService::find_user(db.get_ref(), user_id)
        .await?
        .ok_or_else(invalid)?;

    if user.verified {
        return Err(ApiError::validation("Your account is already verified!"));
    }

    let otp = AuthService::issue_verification_token(db.get_ref(), user.id).await?;
    notifier.send(MailKind::Verification { otp }, recipient(&user));

    Ok(HttpResponse::Ok().json(json!({ "message": "Please check your email." })))
}

/// POST /auth/forget-password - Envoyer le lien de reset par email
#[post("/forget-password")]
pub async fn forget_password(
    body: web::Json<ForgetPasswordRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    notifier: web::Data<Notifier>,
) -> Result<HttpResponse, ApiError> {
    let user = AuthService::find_user_by_email(db.get_ref(), &body.email)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found!"))?;

    let token = AuthService::issue_reset_token(db.get_ref(), user.id).await?;
    let link = format!(
        "{}?token={}&userId={}",
        config.mail.password_reset_link, token, user.id
    );

    notifier.send(MailKind::ForgotPassword { link }, recipient(&user));

    Ok(HttpResponse::Ok().json(json!({
        "message": "Check your registered email to reset password."
    })))
}

/// POST /auth/verify-pass-reset-token - Vérifier le token du lien (sans le consommer)
#[post("/verify-pass-reset-token")]
pub async fn verify_pass_reset_token(
    body: ValidatedJson<TokenRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let user_id = parse_id(&body.0.user_id, "Invalid userId!")?;

    AuthService::check_reset_token(db.get_ref(), user_id, &body.0.token).await?;

    Ok(HttpResponse::Ok().json(json!({ "valid": true })))
}

/// POST /auth/update-password - Nouveau mot de passe (token de reset requis)
#[post("/update-password")]
pub async fn update_password(
    body: ValidatedJson<UpdatePasswordRequest>,
    db: web::Data<DatabaseConnection>,
    notifier: web::Data<Notifier>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let user_id = parse_id(&body.user_id, "Invalid userId!")?;

    let user = AuthService::consume_reset_token(db.get_ref(), user_id, &body.token, &body.password).await?;
    notifier.send(MailKind::ResetConfirmed, recipient(&user));

    Ok(HttpResponse::Ok().json(json!({ "message": "Password reset successfully!" })))
}

/// POST /auth/sign-in - Se connecter (PUBLIC)
#[post("/sign-in")]
pub async fn sign_in(
    body: ValidatedJson<SignInRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let (user, token) = AuthService::authenticate(
        db.get_ref(),
        &config.jwt_secret,
        config.session_ttl_hours,
        &body.0.email,
        &body.0.password,
    )
    .await?;

    let profile = ProfileService::profile_of(db.get_ref(), &user).await?;

    Ok(HttpResponse::Ok().json(json!({ "profile": profile, "token": token })))
}

/// GET /auth/is-auth - Profil de l'utilisateur connecté (PROTÉGÉ)
#[get("/is-auth")]
pub async fn is_auth(user: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "profile": user.profile }))
}

#[derive(MultipartForm)]
pub struct ProfileForm {
    pub name: Option<Text<String>>,
    pub avatar: Option<TempFile>,
}

/// POST /auth/update-profile - Nom + avatar (PROTÉGÉ, multipart)
/// Nouvel avatar: upload, enregistrement, PUIS suppression de l'ancien
#[post("/update-profile")]
pub async fn update_profile(
    user: AuthUser,
    MultipartForm(form): MultipartForm<ProfileForm>,
    db: web::Data<DatabaseConnection>,
    media: web::Data<dyn MediaStore>,
) -> Result<HttpResponse, ApiError> {
    let name = form
        .name
        .map(|name| name.into_inner().trim().to_string())
        .filter(|name| name.chars().count() >= 3)
        .ok_or_else(|| ApiError::validation("Invalid name!"))?;

    let current = AuthService::find_user(db.get_ref(), user.profile.id)
        .await?
        .ok_or_else(|| ApiError::auth("Unauthorized request!"))?;

    let new_avatar = match provided(form.avatar) {
        Some(file) => Some(media.upload(read_upload(&file, MediaKind::Avatar).await?).await?),
        None => None,
    };

    let old_avatar = current.avatar_public_id.clone();
    let mut active: users::ActiveModel = current.into();
    active.name = Set(name);
    let replaced = new_avatar.is_some();
    if let Some(asset) = new_avatar {
        active.avatar_url = Set(Some(asset.url));
        active.avatar_public_id = Set(Some(asset.public_id));
    }
    active.updated_at = Set(Utc::now());
    let updated = active.update(db.get_ref()).await?;

    if let (true, Some(old)) = (replaced, old_avatar) {
        remove_quietly(media.get_ref(), &old, MediaKind::Avatar).await;
    }

    let profile = ProfileService::profile_of(db.get_ref(), &updated).await?;
    Ok(HttpResponse::Ok().json(json!({ "profile": profile })))
}

/// POST /auth/log-out - Déconnexion (?fromAll=yes pour tous les appareils)
#[post("/log-out")]
pub async fn log_out(
    user: AuthUser,
    query: web::Query<LogOutQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    if query.from_all.as_deref() == Some("yes") {
        AuthService::revoke_all(db.get_ref(), user.profile.id).await?;
    } else {
        AuthService::revoke(db.get_ref(), &user.token).await?;
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(create_user)
            .service(verify_email)
            .service(re_verify_email)
            .service(forget_password)
            .service(verify_pass_reset_token)
            .service(update_password)
            .service(sign_in)
            .service(is_auth)
            .service(update_profile)
            .service(log_out),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::email_verification_tokens;
    use crate::test_support::{
        TestContext, bearer, multipart_body, multipart_content_type, seed_avatar, seed_user,
        test_app,
    };
    use actix_web::http::StatusCode;
    use actix_web::test;
    use sea_orm::{EntityTrait, PaginatorTrait};

    #[actix_web::test]
    async fn test_sign_up_then_sign_in() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/auth/create")
            .set_json(json!({ "name": "Alice", "email": "a@x.com", "password": "Secret1!" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["user"]["name"], "Alice");
        assert_eq!(body["user"]["email"], "a@x.com");
        assert!(body["user"].get("password_hash").is_none());

        let mails = ctx.mailer.wait_for(1).await;
        assert_eq!(mails[0].to, "a@x.com");
        assert_eq!(email_verification_tokens::Entity::find().count(&ctx.db).await.unwrap(), 1);

        let req = test::TestRequest::post()
            .uri("/auth/sign-in")
            .set_json(json!({ "email": "a@x.com", "password": "Secret1!" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["profile"]["verified"], false);
        assert_eq!(body["profile"]["followers"], 0);
        assert!(body["token"].as_str().is_some());

        let req = test::TestRequest::post()
            .uri("/auth/sign-in")
            .set_json(json!({ "email": "a@x.com", "password": "Wrong1!!" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Email/Password mismatched!");
    }

    #[actix_web::test]
    async fn test_duplicate_email_is_rejected() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);
        seed_user(&ctx.db, "Alice", "a@x.com", false).await;

        let req = test::TestRequest::post()
            .uri("/auth/create")
            .set_json(json!({ "name": "Alice", "email": "a@x.com", "password": "Secret1!" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Email is already in use!");
    }

    #[actix_web::test]
    async fn test_invalid_payloads_are_422() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/auth/create")
            .set_json(json!({ "name": "Alice", "email": "a@x.com", "password": "short" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Password is too short!");

        let req = test::TestRequest::post()
            .uri("/auth/sign-in")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn test_verify_email_flow() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);
        let (user, _) = seed_user(&ctx.db, "Alice", "a@x.com", false).await;
        let otp = AuthService::issue_verification_token(&ctx.db, user.id).await.unwrap();
        let wrong = if otp == "000000" { "111111" } else { "000000" };

        let req = test::TestRequest::post()
            .uri("/auth/verify-email")
            .set_json(json!({ "token": wrong, "userId": user.id }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri("/auth/verify-email")
            .set_json(json!({ "token": otp, "userId": user.id }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Email verified successfully!");

        let req = test::TestRequest::post()
            .uri("/auth/re-verify-email")
            .set_json(json!({ "userId": user.id }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::post()
            .uri("/auth/re-verify-email")
            .set_json(json!({ "userId": "nope" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_password_reset_flow() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);
        seed_user(&ctx.db, "Alice", "a@x.com", true).await;

        let req = test::TestRequest::post()
            .uri("/auth/forget-password")
            .set_json(json!({ "email": "nobody@x.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri("/auth/forget-password")
            .set_json(json!({ "email": "a@x.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        // Le lien du mail porte token + userId
        let mails = ctx.mailer.wait_for(1).await;
        let html = &mails[0].html;
        let start = html.find("token=").unwrap() + "token=".len();
        let token: String = html[start..].chars().take_while(|c| c.is_ascii_hexdigit()).collect();
        let start = html.find("userId=").unwrap() + "userId=".len();
        let user_id: String = html[start..]
            .chars()
            .take_while(|c| c.is_ascii_hexdigit() || *c == '-')
            .collect();

        let req = test::TestRequest::post()
            .uri("/auth/verify-pass-reset-token")
            .set_json(json!({ "token": token, "userId": user_id }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["valid"], true);

        let req = test::TestRequest::post()
            .uri("/auth/update-password")
            .set_json(json!({ "token": token, "userId": user_id, "password": "Secret1!" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::post()
            .uri("/auth/update-password")
            .set_json(json!({ "token": token, "userId": user_id, "password": "Newpass1!" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Password reset successfully!");

        let req = test::TestRequest::post()
            .uri("/auth/verify-pass-reset-token")
            .set_json(json!({ "token": token, "userId": user_id }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Unauthorized access, invalid token!");

        let req = test::TestRequest::post()
            .uri("/auth/sign-in")
            .set_json(json!({ "email": "a@x.com", "password": "Newpass1!" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_log_out_single_device_and_all() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);
        let (_, phone) = seed_user(&ctx.db, "Alice", "a@x.com", true).await;
        let (_, laptop) =
            AuthService::authenticate(&ctx.db, &ctx.config.jwt_secret, 24, "a@x.com", "Secret1!")
                .await
                .unwrap();
        let (_, tablet) =
            AuthService::authenticate(&ctx.db, &ctx.config.jwt_secret, 24, "a@x.com", "Secret1!")
                .await
                .unwrap();

        let req = test::TestRequest::post()
            .uri("/auth/log-out")
            .insert_header(bearer(&phone))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let is_auth_req = |token: &str| {
            test::TestRequest::get()
                .uri("/auth/is-auth")
                .insert_header(bearer(token))
                .to_request()
        };
        assert_eq!(test::call_service(&app, is_auth_req(&phone)).await.status(), StatusCode::FORBIDDEN);
        assert_eq!(test::call_service(&app, is_auth_req(&laptop)).await.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/auth/log-out?fromAll=yes")
            .insert_header(bearer(&laptop))
            .to_request();
        test::call_service(&app, req).await;

        assert_eq!(test::call_service(&app, is_auth_req(&laptop)).await.status(), StatusCode::FORBIDDEN);
        assert_eq!(test::call_service(&app, is_auth_req(&tablet)).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_update_profile_replaces_avatar_after_upload() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);
        let (_, token) = seed_user(&ctx.db, "Alice", "a@x.com", true).await;

        let upload = |name: &str| {
            test::TestRequest::post()
                .uri("/auth/update-profile")
                .insert_header(bearer(&token))
                .insert_header(multipart_content_type())
                .set_payload(multipart_body(
                    &[("name", name)],
                    &[("avatar", "me.png", b"png-bytes".as_slice())],
                ))
                .to_request()
        };

        let body: serde_json::Value = test::call_and_read_body_json(&app, upload("Alice B")).await;
        assert_eq!(body["profile"]["name"], "Alice B");
        assert_eq!(body["profile"]["avatar"], "https://media.test/1/me.png");
        assert!(ctx.media.removed().is_empty());

        test::call_service(&app, upload("Alice C")).await;
        let removed = ctx.media.removed();
        assert_eq!(removed, vec![("asset-1".to_string(), MediaKind::Avatar)]);

        let resp = test::call_service(&app, upload("Al")).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid name!");
    }

    #[actix_web::test]
    async fn test_failed_avatar_upload_keeps_old_avatar() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);
        let (alice, token) = seed_user(&ctx.db, "Alice", "a@x.com", true).await;
        let alice = seed_avatar(&ctx.db, alice, "avatar-old").await;
        ctx.media.set_failing(true);

        let req = test::TestRequest::post()
            .uri("/auth/update-profile")
            .insert_header(bearer(&token))
            .insert_header(multipart_content_type())
            .set_payload(multipart_body(
                &[("name", "Alice B")],
                &[("avatar", "me.png", b"png-bytes".as_slice())],
            ))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(ctx.media.removed().is_empty());

        let stored = users::Entity::find_by_id(alice.id).one(&ctx.db).await.unwrap().unwrap();
        assert_eq!(stored.name, "Alice");
        assert_eq!(stored.avatar_public_id.as_deref(), Some("avatar-old"));
        assert_eq!(stored.avatar_url, alice.avatar_url);

        let req = test::TestRequest::post()
            .uri("/auth/update-profile")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "Alice" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Only accepts form-data!");
    }
}

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header::AUTHORIZATION, web};
use futures::future::LocalBoxFuture;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::dto::Profile;
use crate::services::auth_service::AuthService;

const UNAUTHORIZED: &str = "Unauthorized request!";
const UNVERIFIED: &str = "Please verify your email account!";

/// Utilisateur authentifié (token Bearer valide ET présent dans session_tokens)
/// Utilisé comme extracteur dans les routes protégées
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub profile: Profile,
    /// Token brut de la requête (nécessaire pour le log-out de l'appareil courant)
    pub token: String,
}

/// Variante permissive: None si pas de token ou token invalide
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

/// AuthUser dont l'email est vérifié
#[derive(Debug, Clone)]
pub struct VerifiedUser(pub AuthUser);

/// Extrait le token du header "Authorization: Bearer <token>"
fn bearer_token(req: &HttpRequest) -> Option<String> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

async fn resolve(req: &HttpRequest) -> Result<Option<AuthUser>, ApiError> {
    let Some(token) = bearer_token(req) else {
        return Ok(None);
    };

    let db = req
        .app_data::<web::Data<DatabaseConnection>>()
        .ok_or_else(|| ApiError::Internal("Database connection is not configured".to_string()))?;
    let config = req
        .app_data::<web::Data<AppConfig>>()
        .ok_or_else(|| ApiError::Internal("App config is not configured".to_string()))?;

    let profile = AuthService::principal_for_token(db.get_ref(), &config.jwt_secret, &token).await?;

    Ok(profile.map(|profile| AuthUser { profile, token }))
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            resolve(&req)
                .await?
                .ok_or_else(|| ApiError::auth(UNAUTHORIZED))
        })
    }
}

impl FromRequest for MaybeAuthUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            match resolve(&req).await {
                Ok(user) => Ok(MaybeAuthUser(user)),
                Err(e) => {
                    tracing::warn!(error = %e, "optional auth lookup failed");
                    Ok(MaybeAuthUser(None))
                }
            }
        })
    }
}

impl FromRequest for VerifiedUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let user = AuthUser::from_request(req, payload);

        Box::pin(async move {
            let user = user.await?;
            if !user.profile.verified {
                return Err(ApiError::auth(UNVERIFIED));
            }
            Ok(VerifiedUser(user))
        })
    }
}

// ============================================================================
// SERVICE : AUTH (comptes, sessions, tokens à usage unique)
// ============================================================================
//
// Description:
//   Seul endroit qui écrit les colonnes secrètes (password_hash, token_hash).
//   Tout secret est hashé ici avant l'insert/update: les routes ne
//   manipulent jamais de hash.
//
// Points d'attention:
//   - OTP email: 6 chiffres, expire après 1h, remplacé à chaque nouvelle demande
//   - Token de reset: 32 octets aléatoires en hex, expire après 1h
//   - Un mauvais code ne supprime jamais le token en base
//   - Sign-in: même message d'erreur que l'email ou le mot de passe soit faux
//
// ============================================================================

use chrono::{Duration, Utc};
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::dto::Profile;
use crate::models::{email_verification_tokens, password_reset_tokens, session_tokens, users};
use crate::services::profile_service::ProfileService;
use crate::utils::{jwt, password};

pub const ONE_TIME_TOKEN_TTL_MINUTES: i64 = 60;
const OTP_LENGTH: usize = 6;

const SIGN_IN_MISMATCH: &str = "Email/Password mismatched!";
const INVALID_TOKEN: &str = "Invalid token!";
const INVALID_RESET_TOKEN: &str = "Unauthorized access, invalid token!";

pub struct AuthService;

/// Génère un OTP numérique (ex: "048213")
pub fn generate_otp() -> String {
    let mut rng = rand::thread_rng();
    (0..OTP_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

fn hash_secret(secret: &str) -> Result<String, ApiError> {
    password::hash_password(secret).map_err(ApiError::Internal)
}

fn secret_matches(candidate: &str, stored_hash: &str) -> Result<bool, ApiError> {
    password::verify_password(candidate, stored_hash).map_err(ApiError::Internal)
}

impl AuthService {
    /// Crée un compte (non vérifié). Conflict si l'email est déjà utilisé.
    pub async fn create_user(
        db: &DatabaseConnection,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<users::Model, ApiError> {
        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ApiError::Conflict("Email is already in use!".to_string()));
        }

        let now = Utc::now();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(hash_secret(password)?),
            verified: Set(false),
            avatar_url: Set(None),
            avatar_public_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let user = user.insert(db).await?;
        tracing::info!(user_id = %user.id, "user created");
        Ok(user)
    }

    pub async fn find_user(db: &DatabaseConnection, user_id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(user_id).one(db).await
    }

    pub async fn find_user_by_email(
        db: &DatabaseConnection,
        email: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await
    }

    // ------------------------------------------------------------------
    // Vérification email
    // ------------------------------------------------------------------

    /// Remplace l'OTP en cours de l'utilisateur et renvoie le nouvel OTP en clair
    pub async fn issue_verification_token(
        db: &DatabaseConnection,
        user_id: Uuid,
    ) -> Result<String, ApiError> {
        email_verification_tokens::Entity::delete_many()
            .filter(email_verification_tokens::Column::UserId.eq(user_id))
            .exec(db)
            .await?;

        let otp = generate_otp();
        let now = Utc::now();
        email_verification_tokens::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            token_hash: Set(hash_secret(&otp)?),
            expires_at: Set(now + Duration::minutes(ONE_TIME_TOKEN_TTL_MINUTES)),
            created_at: Set(now),
        }
        .insert(db)
        .await?;

        Ok(otp)
    }

    pub async fn consume_verification_token(
        db: &DatabaseConnection,
        user_id: Uuid,
        candidate: &str,
    ) -> Result<(), ApiError> {
        let token = email_verification_tokens::Entity::find()
            .filter(email_verification_tokens::Column::UserId.eq(user_id))
            .filter(email_verification_tokens::Column::ExpiresAt.gt(Utc::now()))
            .order_by_desc(email_verification_tokens::Column::CreatedAt)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::auth(INVALID_TOKEN))?;

        if !secret_matches(candidate, &token.token_hash)? {
            return Err(ApiError::auth(INVALID_TOKEN));
        }

        users::Entity::update_many()
            .col_expr(users::Column::Verified, Expr::value(true))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .exec(db)
            .await?;

        email_verification_tokens::Entity::delete_by_id(token.id)
            .exec(db)
            .await?;

        tracing::info!(user_id = %user_id, "email verified");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reset du mot de passe
    // ------------------------------------------------------------------

    /// Remplace le token de reset en cours et renvoie le nouveau token en clair
    pub async fn issue_reset_token(db: &DatabaseConnection, user_id: Uuid) -> Result<String, ApiError> {
        password_reset_tokens::Entity::delete_many()
            .filter(password_reset_tokens::Column::UserId.eq(user_id))
            .exec(db)
            .await?;

        let token = generate_reset_token();
        let now = Utc::now();
        password_reset_tokens::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            token_hash: Set(hash_secret(&token)?),
            expires_at: Set(now + Duration::minutes(ONE_TIME_TOKEN_TTL_MINUTES)),
            created_at: Set(now),
        }
        .insert(db)
        .await?;

        Ok(token)
    }

    /// Vérifie un token de reset sans le consommer
    pub async fn check_reset_token(
        db: &DatabaseConnection,
        user_id: Uuid,
        candidate: &str,
    ) -> Result<password_reset_tokens::Model, ApiError> {
        let token = password_reset_tokens::Entity::find()
            .filter(password_reset_tokens::Column::UserId.eq(user_id))
            .filter(password_reset_tokens::Column::ExpiresAt.gt(Utc::now()))
            .order_by_desc(password_reset_tokens::Column::CreatedAt)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::auth(INVALID_RESET_TOKEN))?;

        if !secret_matches(candidate, &token.token_hash)? {
            return Err(ApiError::auth(INVALID_RESET_TOKEN));
        }

        Ok(token)
    }

    /// Change le mot de passe si le token est valide, puis supprime le token
    pub async fn consume_reset_token(
        db: &DatabaseConnection,
        user_id: Uuid,
        candidate: &str,
        new_password: &str,
    ) -> Result<users::Model, ApiError> {
        Self::check_reset_token(db, user_id, candidate).await?;

        let user = Self::find_user(db, user_id)
            .await?
            .ok_or_else(|| ApiError::auth("Unauthorized access!"))?;

        if secret_matches(new_password, &user.password_hash)? {
            return Err(ApiError::validation(
                "New password cannot be the same as the old one!",
            ));
        }

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(hash_secret(new_password)?);
        active.updated_at = Set(Utc::now());
        let user = active.update(db).await?;

        password_reset_tokens::Entity::delete_many()
            .filter(password_reset_tokens::Column::UserId.eq(user_id))
            .exec(db)
            .await?;

        tracing::info!(user_id = %user_id, "password reset");
        Ok(user)
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    /// Sign-in: renvoie l'utilisateur et un nouveau token de session
    pub async fn authenticate(
        db: &DatabaseConnection,
        jwt_secret: &str,
        ttl_hours: i64,
        email: &str,
        password: &str,
    ) -> Result<(users::Model, String), ApiError> {
        let user = Self::find_user_by_email(db, email)
            .await?
            .ok_or_else(|| ApiError::auth(SIGN_IN_MISMATCH))?;

        if !secret_matches(password, &user.password_hash)? {
            return Err(ApiError::auth(SIGN_IN_MISMATCH));
        }

        let token = jwt::generate_token(user.id, jwt_secret, ttl_hours).map_err(ApiError::Internal)?;

        session_tokens::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.id),
            token_hash: Set(jwt::hash_token(&token)),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;

        tracing::info!(user_id = %user.id, "user signed in");
        Ok((user, token))
    }

    /// Résout un token de session en principal.
    /// None si le JWT est invalide/expiré ou s'il n'est plus dans la liste active.
    pub async fn principal_for_token(
        db: &DatabaseConnection,
        jwt_secret: &str,
        token: &str,
    ) -> Result<Option<Profile>, DbErr> {
        let claims = match jwt::verify_token(token, jwt_secret) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "rejected session token");
                return Ok(None);
            }
        };

        let session = session_tokens::Entity::find()
            .filter(session_tokens::Column::TokenHash.eq(jwt::hash_token(token)))
            .filter(session_tokens::Column::UserId.eq(claims.user_id))
            .find_also_related(users::Entity)
            .one(db)
            .await?;

        match session {
            Some((_, Some(user))) => Ok(Some(ProfileService::profile_of(db, &user).await?)),
            _ => Ok(None),
        }
    }

    /// Déconnexion de l'appareil courant
    pub async fn revoke(db: &DatabaseConnection, token: &str) -> Result<(), DbErr> {
        session_tokens::Entity::delete_many()
            .filter(session_tokens::Column::TokenHash.eq(jwt::hash_token(token)))
            .exec(db)
            .await?;
        Ok(())
    }

    /// Déconnexion de tous les appareils
    pub async fn revoke_all(db: &DatabaseConnection, user_id: Uuid) -> Result<(), DbErr> {
        session_tokens::Entity::delete_many()
            .filter(session_tokens::Column::UserId.eq(user_id))
            .exec(db)
            .await?;
        Ok(())
    }
}

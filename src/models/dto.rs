// Requêtes (validées) et réponses structurées de l'API
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::middleware::validator::{
    FieldOrder, object_id_or_empty, optional_string, trimmed, validate_audio_id, validate_category,
    validate_history_date, validate_password, validate_visibility,
};
use crate::models::{audios, users};

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(min = 3, max = 20, message = "Invalid name!"))]
    pub name: String,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(email(message = "Invalid email id!"))]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

impl FieldOrder for CreateUserRequest {
    const FIELDS: &'static [&'static str] = &["name", "email", "password"];
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(email(message = "Invalid email id!"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is missing!"))]
    pub password: String,
}

impl FieldOrder for SignInRequest {
    const FIELDS: &'static [&'static str] = &["email", "password"];
}

/// Body de /auth/verify-email et /auth/verify-pass-reset-token
#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "Invalid token!"))]
    pub token: String,
    #[serde(rename = "userId", default, deserialize_with = "object_id_or_empty")]
    #[validate(length(min = 1, message = "Invalid userId!"))]
    pub user_id: String,
}

impl FieldOrder for TokenRequest {
    const FIELDS: &'static [&'static str] = &["token", "user_id"];
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePasswordRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "Invalid token!"))]
    pub token: String,
    #[serde(rename = "userId", default, deserialize_with = "object_id_or_empty")]
    #[validate(length(min = 1, message = "Invalid userId!"))]
    pub user_id: String,
    #[serde(default)]
    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

impl FieldOrder for UpdatePasswordRequest {
    const FIELDS: &'static [&'static str] = &["token", "user_id", "password"];
}

#[derive(Debug, Deserialize)]
pub struct ReVerifyEmailRequest {
    #[serde(rename = "userId", default)]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgetPasswordRequest {
    #[serde(default, deserialize_with = "trimmed")]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LogOutQuery {
    #[serde(rename = "fromAll")]
    pub from_all: Option<String>,
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

/// Champs texte du formulaire multipart /audio/create et PATCH /audio/{id}
#[derive(Debug, Validate)]
pub struct AudioFields {
    #[validate(length(min = 1, message = "Title is missing!"))]
    pub title: String,
    #[validate(length(min = 1, message = "About is missing!"))]
    pub about: String,
    #[validate(custom(function = "validate_category"))]
    pub category: String,
}

impl FieldOrder for AudioFields {
    const FIELDS: &'static [&'static str] = &["title", "about", "category"];
}

// ---------------------------------------------------------------------------
// Playlist
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct NewPlaylistRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "Title is missing!"))]
    pub title: String,
    #[serde(rename = "audioId", default, deserialize_with = "optional_string")]
    #[validate(custom(function = "validate_audio_id"))]
    pub audio_id: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    #[validate(custom(function = "validate_visibility"))]
    pub visibility: Option<String>,
}

impl FieldOrder for NewPlaylistRequest {
    const FIELDS: &'static [&'static str] = &["title", "audio_id", "visibility"];
}

#[derive(Debug, Deserialize, Validate)]
pub struct OldPlaylistRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "Title is missing!"))]
    pub title: String,
    #[serde(default, deserialize_with = "object_id_or_empty")]
    #[validate(length(min = 1, message = "Invalid playlist id!"))]
    pub id: String,
    #[serde(alias = "audioId", default, deserialize_with = "optional_string")]
    #[validate(custom(function = "validate_audio_id"))]
    pub item: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    #[validate(custom(function = "validate_visibility"))]
    pub visibility: Option<String>,
}

impl FieldOrder for OldPlaylistRequest {
    const FIELDS: &'static [&'static str] = &["title", "id", "item", "visibility"];
}

#[derive(Debug, Deserialize)]
pub struct RemovePlaylistQuery {
    #[serde(rename = "playlistId", default)]
    pub playlist_id: String,
    #[serde(rename = "audioId")]
    pub audio_id: Option<String>,
    pub all: Option<String>,
}

// ---------------------------------------------------------------------------
// Favorites / History
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AudioIdQuery {
    #[serde(rename = "audioId", default)]
    pub audio_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateHistoryRequest {
    #[serde(default, deserialize_with = "object_id_or_empty")]
    #[validate(length(min = 1, message = "Invalid audio id!"))]
    pub audio: String,
    #[serde(default)]
    #[validate(required(message = "History progress is missing!"))]
    pub progress: Option<f64>,
    #[serde(default)]
    #[validate(custom(function = "validate_history_date"))]
    pub date: String,
}

impl FieldOrder for UpdateHistoryRequest {
    const FIELDS: &'static [&'static str] = &["audio", "progress", "date"];
}

#[derive(Debug, Deserialize)]
pub struct RemoveHistoryQuery {
    /// Tableau JSON d'identifiants: histories=["id1","id2"]
    pub histories: Option<String>,
    pub all: Option<String>,
}

// ---------------------------------------------------------------------------
// Réponses
// ---------------------------------------------------------------------------

/// Projection publique d'un utilisateur (aussi utilisée comme principal)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub verified: bool,
    pub avatar: Option<String>,
    pub followers: u64,
    pub followings: u64,
}

impl Profile {
    pub fn from_user(user: &users::Model, followers: u64, followings: u64) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            verified: user.verified,
            avatar: user.avatar_url.clone(),
            followers,
            followings,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserCreated {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Profil visible par tous (pas d'email)
#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub name: String,
    pub avatar: Option<String>,
    pub followers: u64,
    pub followings: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OwnerInfo {
    pub id: Uuid,
    pub name: String,
}

/// Élément d'une liste d'audios (latest, favoris, playlist, uploads...)
#[derive(Debug, Clone, Serialize)]
pub struct AudioSummary {
    pub id: Uuid,
    pub title: String,
    pub about: String,
    pub category: String,
    pub file: String,
    pub poster: Option<String>,
    pub owner: OwnerInfo,
}

#[derive(Debug, Serialize)]
pub struct AudioResponse {
    pub id: Uuid,
    pub title: String,
    pub about: String,
    pub category: String,
    pub file: String,
    pub poster: Option<String>,
}

impl AudioResponse {
    pub fn from_model(audio: &audios::Model) -> Self {
        Self {
            id: audio.id,
            title: audio.title.clone(),
            about: audio.about.clone(),
            category: audio.category.clone(),
            file: audio.file_url.clone(),
            poster: audio.poster_url.clone(),
        }
    }
}

/// Résultat d'un toggle (favori, follow)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleStatus {
    Added,
    Removed,
}

#[derive(Debug, Serialize)]
pub struct PlaylistInfo {
    pub id: Uuid,
    pub title: String,
    pub visibility: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub id: Uuid,
    pub title: String,
    pub items_count: i64,
    pub visibility: String,
}

#[derive(Debug, Serialize)]
pub struct PlaylistAudios {
    pub id: Uuid,
    pub title: String,
    pub audios: Vec<AudioSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: Uuid,
    pub audio_id: Uuid,
    pub title: String,
    pub date: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct HistoryGroup {
    pub date: String, // YYYY-MM-DD
    pub audios: Vec<HistoryItem>,
}

#[derive(Debug, Serialize)]
pub struct RecentlyPlayed {
    #[serde(flatten)]
    pub audio: AudioSummary,
    pub progress: f64,
    pub date: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: bool,
    pub time: chrono::DateTime<chrono::Utc>,
}

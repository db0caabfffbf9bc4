// Outils partagés par les tests: base SQLite en mémoire, faux Cloudinary,
// faux SMTP, utilisateurs/audios de départ et construction de l'App complète.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db;
use crate::models::{audios, users};
use crate::routes::AppState;
use crate::services::auth_service::AuthService;
use crate::services::mail_service::{MailError, Mailer, Notifier, OutgoingMail};
use crate::services::media_service::{MediaError, MediaKind, MediaStore, MediaUpload, UploadedAsset};

pub const SEED_PASSWORD: &str = "Secret1!";
pub const BOUNDARY: &str = "panmusic-test-boundary";

/// Une seule connexion: chaque connexion SQLite ":memory:" a sa propre base
pub async fn test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await.expect("sqlite connection");
    db::sync_schema(&db).await.expect("schema creation");
    db
}

pub fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some("sqlite::memory:".to_string()),
        "JWT_SECRET" => Some("test-secret".to_string()),
        "PASSWORD_RESET_LINK" => Some("https://panmusic.app/reset-password".to_string()),
        "SIGN_IN_URL" => Some("https://panmusic.app/sign-in".to_string()),
        _ => None,
    })
    .expect("test config")
}

// ---------------------------------------------------------------------------
// Faux adaptateurs
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeMediaStore {
    uploads: Mutex<Vec<MediaUpload>>,
    removed: Mutex<Vec<(String, MediaKind)>>,
    fail_uploads: AtomicBool,
}

impl FakeMediaStore {
    /// Les uploads suivants échouent (Cloudinary injoignable)
    pub fn set_failing(&self, failing: bool) {
        self.fail_uploads.store(failing, Ordering::SeqCst);
    }

    pub fn uploads(&self) -> Vec<MediaUpload> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<(String, MediaKind)> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaStore for FakeMediaStore {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedAsset, MediaError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(MediaError::Upload("cloud unreachable".to_string()));
        }

        let mut uploads = self.uploads.lock().unwrap();
        let n = uploads.len() + 1;
        let asset = UploadedAsset {
            url: format!("https://media.test/{}/{}", n, upload.file_name),
            public_id: format!("asset-{}", n),
        };
        uploads.push(upload);
        Ok(asset)
    }

    async fn remove(&self, public_id: &str, kind: MediaKind) -> Result<(), MediaError> {
        self.removed.lock().unwrap().push((public_id.to_string(), kind));
        Ok(())
    }
}

/// Enregistre chaque mail envoyé (même en mode failing, avant de renvoyer l'erreur)
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }

    /// Les envois sont détachés: on attend qu'au moins `count` mails soient passés
    pub async fn wait_for(&self, count: usize) -> Vec<OutgoingMail> {
        for _ in 0..200 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(mail);
        if self.fail {
            return Err(MailError::Transport("relay unreachable".to_string()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Données de départ
// ---------------------------------------------------------------------------

/// Crée un utilisateur (mot de passe SEED_PASSWORD) et ouvre une session
pub async fn seed_user(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    verified: bool,
) -> (users::Model, String) {
    let user = AuthService::create_user(db, name, email, SEED_PASSWORD)
        .await
        .expect("seed user");

    if verified {
        users::Entity::update_many()
            .col_expr(users::Column::Verified, Expr::value(true))
            .filter(users::Column::Id.eq(user.id))
            .exec(db)
            .await
            .expect("verify seed user");
    }

    let config = test_config();
    AuthService::authenticate(db, &config.jwt_secret, config.session_ttl_hours, email, SEED_PASSWORD)
        .await
        .expect("seed sign-in")
}

pub async fn seed_audio(db: &DatabaseConnection, owner_id: Uuid, title: &str, category: &str) -> audios::Model {
    let now = Utc::now();
    let id = Uuid::new_v4();
    audios::ActiveModel {
        id: Set(id),
        owner_id: Set(owner_id),
        title: Set(title.to_string()),
        about: Set(format!("About {}", title)),
        category: Set(category.to_string()),
        file_url: Set(format!("https://media.test/audio/{}.mp3", id)),
        file_public_id: Set(format!("audio-{}", id)),
        poster_url: Set(None),
        poster_public_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed audio")
}

/// Poster déjà en ligne sur un audio existant
pub async fn seed_poster(db: &DatabaseConnection, audio: audios::Model, public_id: &str) -> audios::Model {
    let mut active: audios::ActiveModel = audio.into();
    active.poster_url = Set(Some(format!("https://media.test/poster/{}.png", public_id)));
    active.poster_public_id = Set(Some(public_id.to_string()));
    active.update(db).await.expect("seed poster")
}

/// Avatar déjà en ligne sur un utilisateur existant
pub async fn seed_avatar(db: &DatabaseConnection, user: users::Model, public_id: &str) -> users::Model {
    let mut active: users::ActiveModel = user.into();
    active.avatar_url = Set(Some(format!("https://media.test/avatar/{}.png", public_id)));
    active.avatar_public_id = Set(Some(public_id.to_string()));
    active.update(db).await.expect("seed avatar")
}

// ---------------------------------------------------------------------------
// App complète
// ---------------------------------------------------------------------------

pub struct TestContext {
    pub db: DatabaseConnection,
    pub media: Arc<FakeMediaStore>,
    pub mailer: Arc<RecordingMailer>,
    pub config: AppConfig,
}

impl TestContext {
    pub async fn new() -> Self {
        Self {
            db: test_db().await,
            media: Arc::new(FakeMediaStore::default()),
            mailer: Arc::new(RecordingMailer::default()),
            config: test_config(),
        }
    }

    pub fn state(&self) -> AppState {
        let media: Arc<dyn MediaStore> = self.media.clone();
        let notifier = Notifier::new(self.mailer.clone(), self.config.mail.sign_in_url.clone());
        AppState::new(self.db.clone(), media, notifier, self.config.clone())
    }
}

/// Construit le service de test avec toutes les routes: `let app = test_app!(ctx);`
macro_rules! test_app {
    ($ctx:expr) => {{
        let state = $ctx.state();
        actix_web::test::init_service(
            actix_web::App::new()
                .configure(|cfg| state.register(cfg))
                .configure(crate::routes::configure_routes),
        )
        .await
    }};
}
pub(crate) use test_app;

pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (actix_web::http::header::AUTHORIZATION, format!("Bearer {}", token))
}

/// Corps multipart/form-data: champs texte puis fichiers (nom du champ, nom du fichier, contenu)
pub fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    for (name, file_name, content) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> (actix_web::http::header::HeaderName, String) {
    (
        actix_web::http::header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={}", BOUNDARY),
    )
}

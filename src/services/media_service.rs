// ============================================================================
// SERVICE : MEDIA (Cloudinary)
// ============================================================================
//
// Description:
//   Envoi des fichiers (audio, poster, avatar) vers Cloudinary et
//   suppression des anciens assets.
//
// Points d'attention:
//   - Les images (poster, avatar) sont recadrées en vignette 300x300 centrée
//     sur le visage (c_thumb,g_face)
//   - Cloudinary n'a pas de type "audio": les audios sont envoyés en "video"
//   - Signature des requêtes en SHA-1, ou SHA-256 si le compte Cloudinary
//     a été basculé (CLOUD_SIGNATURE_ALGORITHM)
//   - Remplacement d'un asset: upload du nouveau, enregistrement en base,
//     PUIS suppression de l'ancien (voir routes::auth et routes::audio)
//
// ============================================================================

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::{CloudConfig, SignatureAlgorithm};

const IMAGE_TRANSFORMATION: &str = "c_thumb,g_face,h_300,w_300";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Remove failed: {0}")]
    Remove(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Poster,
    Avatar,
}

impl MediaKind {
    fn resource_type(&self) -> &'static str {
        match self {
            MediaKind::Audio => "video",
            MediaKind::Poster | MediaKind::Avatar => "image",
        }
    }

    /// Transformation appliquée à l'upload (aucune pour l'audio)
    pub fn transformation(&self) -> Option<&'static str> {
        match self {
            MediaKind::Audio => None,
            MediaKind::Poster | MediaKind::Avatar => Some(IMAGE_TRANSFORMATION),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub kind: MediaKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedAsset {
    pub url: String,
    pub public_id: String,
}

//trait = Interface (Cloudinary en prod, faux store en mémoire dans les tests)
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedAsset, MediaError>;

    async fn remove(&self, public_id: &str, kind: MediaKind) -> Result<(), MediaError>;
}

/// Suppression best-effort d'un ancien asset: l'échec est loggé, jamais propagé
pub async fn remove_quietly(store: &dyn MediaStore, public_id: &str, kind: MediaKind) {
    if let Err(e) = store.remove(public_id, kind).await {
        tracing::warn!(public_id, error = %e, "failed to remove old asset");
    }
}

pub struct CloudinaryStore {
    client: reqwest::Client,
    config: CloudConfig,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryStore {
    pub fn new(config: CloudConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, kind: MediaKind, action: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/{}/{}",
            self.config.cloud_name,
            kind.resource_type(),
            action
        )
    }

    fn sign(&self, params: &[(&str, &str)]) -> String {
        sign_params(params, &self.config.api_secret, self.config.signature_algorithm)
    }
}

/// Signature Cloudinary: paramètres triés "k=v&k=v" + secret, puis digest en hex
pub fn sign_params(params: &[(&str, &str)], api_secret: &str, algorithm: SignatureAlgorithm) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    match algorithm {
        SignatureAlgorithm::Sha1 => hex_digest::<Sha1>(&to_sign, api_secret),
        SignatureAlgorithm::Sha256 => hex_digest::<Sha256>(&to_sign, api_secret),
    }
}

fn hex_digest<D: Digest>(to_sign: &str, api_secret: &str) -> String {
    let mut hasher = D::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedAsset, MediaError> {
        let timestamp = Utc::now().timestamp().to_string();
        let transformation = upload.kind.transformation().unwrap_or("");

        let signature = self.sign(&[
            ("timestamp", timestamp.as_str()),
            ("transformation", transformation),
        ]);

        let mut form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.clone())
            .text("signature", signature);
        if !transformation.is_empty() {
            form = form.text("transformation", transformation.to_string());
        }
        form = form.part("file", Part::bytes(upload.bytes).file_name(upload.file_name));

        let response = self
            .client
            .post(self.endpoint(upload.kind, "upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Upload(format!("{}: {}", status, body)));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Upload(e.to_string()))?;

        tracing::debug!(public_id = %body.public_id, "asset uploaded");

        Ok(UploadedAsset {
            url: body.secure_url,
            public_id: body.public_id,
        })
    }

    async fn remove(&self, public_id: &str, kind: MediaKind) -> Result<(), MediaError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[("public_id", public_id), ("timestamp", timestamp.as_str())]);

        let params = [
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp),
            ("api_key", self.config.api_key.clone()),
            ("signature", signature),
        ];

        let response = self
            .client
            .post(self.endpoint(kind, "destroy"))
            .form(&params)
            .send()
            .await
            .map_err(|e| MediaError::Remove(e.to_string()))?;

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Remove(e.to_string()))?;

        // "not found" = déjà supprimé, on considère que c'est bon
        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(MediaError::Remove(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_sorts_and_skips_empty() {
        let a = sign_params(
            &[("timestamp", "1700000000"), ("public_id", "abc")],
            "secret",
            SignatureAlgorithm::Sha256,
        );
        let b = sign_params(
            &[("public_id", "abc"), ("transformation", ""), ("timestamp", "1700000000")],
            "secret",
            SignatureAlgorithm::Sha256,
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    // Exemple de la documentation Cloudinary ("Generating authentication signatures")
    #[test]
    fn test_sha1_signature_known_answer() {
        let signature = sign_params(
            &[
                ("timestamp", "1315060510"),
                ("public_id", "sample_image"),
                ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop"),
            ],
            "abcd",
            SignatureAlgorithm::Sha1,
        );
        assert_eq!(signature, "bfd09f95f331f558cbd1320e67aa8d488770583e");
    }

    #[test]
    fn test_image_kinds_are_thumbnailed() {
        assert_eq!(MediaKind::Poster.transformation(), Some("c_thumb,g_face,h_300,w_300"));
        assert_eq!(MediaKind::Avatar.transformation(), Some("c_thumb,g_face,h_300,w_300"));
        assert_eq!(MediaKind::Audio.transformation(), None);
        assert_eq!(MediaKind::Audio.resource_type(), "video");
    }
}

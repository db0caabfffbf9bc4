// ============================================================================
// SERVICE : PLAYLIST
// ============================================================================
//
// Points d'attention:
//   - Une playlist appartenant à un autre utilisateur est traitée comme absente
//   - Ajouter un audio déjà présent ne crée pas de doublon
//   - Les playlists "auto" n'apparaissent jamais dans les listes par profil
//
// ============================================================================

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::db::is_unique_violation;
use crate::error::ApiError;
use crate::models::dto::{AudioSummary, PlaylistAudios, PlaylistSummary};
use crate::models::playlists::Visibility;
use crate::models::{audios, playlist_items, playlists};
use crate::services::audio_service::{AudioRow, AudioService, summary_columns};
use crate::utils::pagination::PaginationQuery;

const PLAYLIST_NOT_FOUND: &str = "Playlist not found!";

#[derive(Debug, FromQueryResult)]
struct PlaylistRow {
    id: Uuid,
    title: String,
    visibility: String,
    items_count: i64,
}

pub struct PlaylistService;

impl PlaylistService {
    pub async fn create(
        db: &DatabaseConnection,
        owner_id: Uuid,
        title: &str,
        audio_id: Option<Uuid>,
        visibility: Visibility,
    ) -> Result<playlists::Model, ApiError> {
        if let Some(audio_id) = audio_id {
            if !AudioService::exists(db, audio_id).await? {
                return Err(ApiError::not_found("Could not found the audio!"));
            }
        }

        let now = Utc::now();
        let playlist = playlists::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(owner_id),
            title: Set(title.to_string()),
            visibility: Set(visibility.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        if let Some(audio_id) = audio_id {
            Self::add_item(db, playlist.id, audio_id).await?;
        }

        Ok(playlist)
    }

    pub async fn find_owned(
        db: &DatabaseConnection,
        owner_id: Uuid,
        playlist_id: Uuid,
    ) -> Result<Option<playlists::Model>, DbErr> {
        playlists::Entity::find_by_id(playlist_id)
            .filter(playlists::Column::OwnerId.eq(owner_id))
            .one(db)
            .await
    }

    /// Renomme, change la visibilité et ajoute éventuellement un audio
    pub async fn update(
        db: &DatabaseConnection,
        owner_id: Uuid,
        playlist_id: Uuid,
        title: &str,
        item: Option<Uuid>,
        visibility: Option<Visibility>,
    ) -> Result<playlists::Model, ApiError> {
        let playlist = Self::find_owned(db, owner_id, playlist_id)
            .await?
            .ok_or_else(|| ApiError::not_found(PLAYLIST_NOT_FOUND))?;

        // Audio vérifié avant toute écriture: un 404 laisse la playlist intacte
        if let Some(audio_id) = item {
            if !AudioService::exists(db, audio_id).await? {
                return Err(ApiError::not_found("Audio not found!"));
            }
        }

        let mut active: playlists::ActiveModel = playlist.into();
        active.title = Set(title.to_string());
        if let Some(visibility) = visibility {
            active.visibility = Set(visibility.to_string());
        }
        active.updated_at = Set(Utc::now());
        let playlist = active.update(db).await?;

        if let Some(audio_id) = item {
            Self::add_item(db, playlist.id, audio_id).await?;
        }

        Ok(playlist)
    }

    /// Audio déjà présent: pas de doublon, l'index unique tranche les ajouts concurrents
    async fn add_item(db: &DatabaseConnection, playlist_id: Uuid, audio_id: Uuid) -> Result<(), DbErr> {
        let inserted = playlist_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            playlist_id: Set(playlist_id),
            audio_id: Set(audio_id),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await;

        match inserted {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Supprime toute la playlist (items compris)
    pub async fn remove(db: &DatabaseConnection, owner_id: Uuid, playlist_id: Uuid) -> Result<(), ApiError> {
        let playlist = Self::find_owned(db, owner_id, playlist_id)
            .await?
            .ok_or_else(|| ApiError::not_found(PLAYLIST_NOT_FOUND))?;

        // SQLite n'applique ON DELETE CASCADE qu'avec PRAGMA foreign_keys
        playlist_items::Entity::delete_many()
            .filter(playlist_items::Column::PlaylistId.eq(playlist.id))
            .exec(db)
            .await?;
        playlists::Entity::delete_by_id(playlist.id).exec(db).await?;

        tracing::info!(playlist_id = %playlist_id, "playlist removed");
        Ok(())
    }

    /// Retire un seul audio de la playlist
    pub async fn remove_item(
        db: &DatabaseConnection,
        owner_id: Uuid,
        playlist_id: Uuid,
        audio_id: Uuid,
    ) -> Result<(), ApiError> {
        let playlist = Self::find_owned(db, owner_id, playlist_id)
            .await?
            .ok_or_else(|| ApiError::not_found(PLAYLIST_NOT_FOUND))?;

        playlist_items::Entity::delete_many()
            .filter(playlist_items::Column::PlaylistId.eq(playlist.id))
            .filter(playlist_items::Column::AudioId.eq(audio_id))
            .exec(db)
            .await?;
        Ok(())
    }

    /// Playlists d'un profil (hors "auto"), plus récentes d'abord.
    /// Les privées ne sont incluses que si include_private.
    pub async fn by_owner(
        db: &DatabaseConnection,
        owner_id: Uuid,
        include_private: bool,
        page: &PaginationQuery,
    ) -> Result<Vec<PlaylistSummary>, DbErr> {
        let mut query = playlists::Entity::find()
            .select_only()
            .column(playlists::Column::Id)
            .column(playlists::Column::Title)
            .column(playlists::Column::Visibility)
            .column_as(
                Expr::col((playlist_items::Entity, playlist_items::Column::Id)).count(),
                "items_count",
            )
            .join(JoinType::LeftJoin, playlists::Relation::Items.def())
            .filter(playlists::Column::OwnerId.eq(owner_id));

        query = if include_private {
            query.filter(playlists::Column::Visibility.ne(Visibility::Auto.as_str()))
        } else {
            query.filter(playlists::Column::Visibility.eq(Visibility::Public.as_str()))
        };

        let rows = query
            .group_by(playlists::Column::Id)
            .order_by_desc(playlists::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .into_model::<PlaylistRow>()
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| PlaylistSummary {
                id: row.id,
                title: row.title,
                items_count: row.items_count,
                visibility: row.visibility,
            })
            .collect())
    }

    /// Contenu d'une playlist de owner_id, None si absente ou étrangère
    pub async fn audios_of(
        db: &DatabaseConnection,
        owner_id: Uuid,
        playlist_id: Uuid,
    ) -> Result<Option<PlaylistAudios>, DbErr> {
        let Some(playlist) = Self::find_owned(db, owner_id, playlist_id).await? else {
            return Ok(None);
        };

        let rows = summary_columns(playlist_items::Entity::find())
            .join(JoinType::InnerJoin, playlist_items::Relation::Audio.def())
            .join(JoinType::InnerJoin, audios::Relation::Owner.def())
            .filter(playlist_items::Column::PlaylistId.eq(playlist.id))
            .order_by_asc(playlist_items::Column::CreatedAt)
            .into_model::<AudioRow>()
            .all(db)
            .await?;

        Ok(Some(PlaylistAudios {
            id: playlist.id,
            title: playlist.title,
            audios: rows.into_iter().map(AudioSummary::from).collect(),
        }))
    }
}

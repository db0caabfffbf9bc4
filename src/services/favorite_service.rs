use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::db::is_unique_violation;
use crate::error::ApiError;
use crate::models::dto::{AudioSummary, ToggleStatus};
use crate::models::{audios, favorites};
use crate::services::audio_service::{AudioRow, AudioService, summary_columns};
use crate::utils::pagination::PaginationQuery;

pub struct FavoriteService;

impl FavoriteService {
    /// Ajoute l'audio aux favoris s'il n'y est pas, le retire sinon.
    /// Une seule écriture: les likes de l'audio sont dérivés de cette table.
    pub async fn toggle(
        db: &DatabaseConnection,
        owner_id: Uuid,
        audio_id: Uuid,
    ) -> Result<ToggleStatus, ApiError> {
        if !AudioService::exists(db, audio_id).await? {
            return Err(ApiError::not_found("Resources not found!"));
        }

        let existing = Self::find(db, owner_id, audio_id).await?;

        let status = match existing {
            Some(favorite) => {
                favorites::Entity::delete_by_id(favorite.id).exec(db).await?;
                ToggleStatus::Removed
            }
            None => {
                Self::insert(db, owner_id, audio_id).await?;
                ToggleStatus::Added
            }
        };

        tracing::debug!(owner_id = %owner_id, audio_id = %audio_id, ?status, "favorite toggled");
        Ok(status)
    }

    /// Une bascule concurrente a déjà inséré la paire: le favori est bien présent
    async fn insert(db: &DatabaseConnection, owner_id: Uuid, audio_id: Uuid) -> Result<(), DbErr> {
        let inserted = favorites::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(owner_id),
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

    async fn find(
        db: &DatabaseConnection,
        owner_id: Uuid,
        audio_id: Uuid,
    ) -> Result<Option<favorites::Model>, DbErr> {
        favorites::Entity::find()
            .filter(favorites::Column::OwnerId.eq(owner_id))
            .filter(favorites::Column::AudioId.eq(audio_id))
            .one(db)
            .await
    }

    pub async fn is_favorite(db: &DatabaseConnection, owner_id: Uuid, audio_id: Uuid) -> Result<bool, DbErr> {
        Ok(Self::find(db, owner_id, audio_id).await?.is_some())
    }

    /// Favoris paginés, dans l'ordre d'ajout
    pub async fn list(
        db: &DatabaseConnection,
        owner_id: Uuid,
        page: &PaginationQuery,
    ) -> Result<Vec<AudioSummary>, DbErr> {
        let rows = summary_columns(favorites::Entity::find())
            .join(JoinType::InnerJoin, favorites::Relation::Audio.def())
            .join(JoinType::InnerJoin, audios::Relation::Owner.def())
            .filter(favorites::Column::OwnerId.eq(owner_id))
            .order_by_asc(favorites::Column::CreatedAt)
            .order_by_asc(favorites::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .into_model::<AudioRow>()
            .all(db)
            .await?;

        Ok(rows.into_iter().map(AudioSummary::from).collect())
    }
}

// ============================================================================
// SERVICE : AUDIO
// ============================================================================
//
// Description:
//   Création / mise à jour des audios et requêtes de liste.
//   Toutes les listes renvoient des AudioSummary (owner réduit à {id, name})
//   construits par une jointure faite en base, jamais en mémoire.
//
// Points d'attention:
//   - summary_columns() est partagé par favoris, playlists et historique:
//     la requête appelante doit joindre audios ET users (owner)
//   - Les likes ne sont pas stockés: ce sont les lignes favorites de l'audio
//
// ============================================================================

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::models::dto::{AudioFields, AudioSummary, OwnerInfo};
use crate::models::{audios, favorites, users};
use crate::services::media_service::UploadedAsset;
use crate::utils::pagination::PaginationQuery;

pub const LATEST_LIMIT: u64 = 10;
pub const RECOMMENDED_LIMIT: u64 = 10;

/// Ligne brute d'une liste d'audios (colonnes aliasées par summary_columns)
#[derive(Debug, FromQueryResult)]
pub struct AudioRow {
    pub id: Uuid,
    pub title: String,
    pub about: String,
    pub category: String,
    pub file_url: String,
    pub poster_url: Option<String>,
    pub owner_id: Uuid,
    pub owner_name: String,
}

impl From<AudioRow> for AudioSummary {
    fn from(row: AudioRow) -> Self {
        AudioSummary {
            id: row.id,
            title: row.title,
            about: row.about,
            category: row.category,
            file: row.file_url,
            poster: row.poster_url,
            owner: OwnerInfo {
                id: row.owner_id,
                name: row.owner_name,
            },
        }
    }
}

/// Sélectionne les colonnes d'un AudioRow sur une requête qui joint audios + users
pub fn summary_columns<E: EntityTrait>(select: Select<E>) -> Select<E> {
    select
        .select_only()
        .column_as(audios::Column::Id, "id")
        .column_as(audios::Column::Title, "title")
        .column_as(audios::Column::About, "about")
        .column_as(audios::Column::Category, "category")
        .column_as(audios::Column::FileUrl, "file_url")
        .column_as(audios::Column::PosterUrl, "poster_url")
        .column_as(users::Column::Id, "owner_id")
        .column_as(users::Column::Name, "owner_name")
}

pub struct AudioService;

impl AudioService {
    pub async fn create(
        db: &DatabaseConnection,
        owner_id: Uuid,
        fields: &AudioFields,
        file: UploadedAsset,
        poster: Option<UploadedAsset>,
    ) -> Result<audios::Model, DbErr> {
        let now = Utc::now();
        let (poster_url, poster_public_id) = match poster {
            Some(asset) => (Some(asset.url), Some(asset.public_id)),
            None => (None, None),
        };

        let audio = audios::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(owner_id),
            title: Set(fields.title.clone()),
            about: Set(fields.about.clone()),
            category: Set(fields.category.clone()),
            file_url: Set(file.url),
            file_public_id: Set(file.public_id),
            poster_url: Set(poster_url),
            poster_public_id: Set(poster_public_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        tracing::info!(audio_id = %audio.id, owner_id = %owner_id, "audio created");
        Ok(audio)
    }

    pub async fn exists(db: &DatabaseConnection, audio_id: Uuid) -> Result<bool, DbErr> {
        let count = audios::Entity::find_by_id(audio_id).count(db).await?;
        Ok(count > 0)
    }

    /// Audio appartenant à owner_id (None si absent OU appartenant à un autre)
    pub async fn find_owned(
        db: &DatabaseConnection,
        owner_id: Uuid,
        audio_id: Uuid,
    ) -> Result<Option<audios::Model>, DbErr> {
        audios::Entity::find_by_id(audio_id)
            .filter(audios::Column::OwnerId.eq(owner_id))
            .one(db)
            .await
    }

    /// Met à jour les métadonnées et, si fourni, le poster.
    /// L'ancien poster n'est PAS supprimé ici: l'appelant le fait après coup.
    pub async fn update(
        db: &DatabaseConnection,
        audio: audios::Model,
        fields: &AudioFields,
        poster: Option<UploadedAsset>,
    ) -> Result<audios::Model, DbErr> {
        let mut active: audios::ActiveModel = audio.into();
        active.title = Set(fields.title.clone());
        active.about = Set(fields.about.clone());
        active.category = Set(fields.category.clone());
        if let Some(asset) = poster {
            active.poster_url = Set(Some(asset.url));
            active.poster_public_id = Set(Some(asset.public_id));
        }
        active.updated_at = Set(Utc::now());

        active.update(db).await
    }

    pub async fn latest(db: &DatabaseConnection) -> Result<Vec<AudioSummary>, DbErr> {
        let rows = summary_columns(audios::Entity::find())
            .join(JoinType::InnerJoin, audios::Relation::Owner.def())
            .order_by_desc(audios::Column::CreatedAt)
            .limit(LATEST_LIMIT)
            .into_model::<AudioRow>()
            .all(db)
            .await?;

        Ok(rows.into_iter().map(AudioSummary::from).collect())
    }

    /// Audios publiés par un profil, du plus récent au plus ancien
    pub async fn uploads_by(
        db: &DatabaseConnection,
        owner_id: Uuid,
        page: &PaginationQuery,
    ) -> Result<Vec<AudioSummary>, DbErr> {
        let rows = summary_columns(audios::Entity::find())
            .join(JoinType::InnerJoin, audios::Relation::Owner.def())
            .filter(audios::Column::OwnerId.eq(owner_id))
            .order_by_desc(audios::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .into_model::<AudioRow>()
            .all(db)
            .await?;

        Ok(rows.into_iter().map(AudioSummary::from).collect())
    }

    /// Audios les plus likés, limités aux catégories données si non vide
    pub async fn most_liked(
        db: &DatabaseConnection,
        categories: &[String],
    ) -> Result<Vec<AudioSummary>, DbErr> {
        let mut query = summary_columns(audios::Entity::find())
            .join(JoinType::InnerJoin, audios::Relation::Owner.def())
            .join(JoinType::LeftJoin, audios::Relation::Favorites.def());

        if !categories.is_empty() {
            query = query.filter(audios::Column::Category.is_in(categories.iter().cloned()));
        }

        let rows = query
            .group_by(audios::Column::Id)
            .group_by(users::Column::Id)
            .order_by(
                Expr::col((favorites::Entity, favorites::Column::Id)).count(),
                Order::Desc,
            )
            .order_by_desc(audios::Column::CreatedAt)
            .limit(RECOMMENDED_LIMIT)
            .into_model::<AudioRow>()
            .all(db)
            .await?;

        Ok(rows.into_iter().map(AudioSummary::from).collect())
    }

    /// Nombre de likes (= nombre de favoris) d'un audio
    pub async fn likes(db: &DatabaseConnection, audio_id: Uuid) -> Result<u64, DbErr> {
        favorites::Entity::find()
            .filter(favorites::Column::AudioId.eq(audio_id))
            .count(db)
            .await
    }
}

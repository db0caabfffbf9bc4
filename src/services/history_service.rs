// ============================================================================
// SERVICE : HISTORY (historique d'écoute)
// ============================================================================
//
// Description:
//   Enregistre la progression de lecture et construit les vues dérivées:
//   historique groupé par jour, écoutés récemment, catégories écoutées.
//
// Workflow POST /history:
//   1. L'audio doit exister
//   2. Déjà écouté le même jour (jour UTC de `date`) → mise à jour progress/date
//   3. Sinon → nouvelle ligne
//
// ============================================================================

use chrono::{DateTime, Duration, Utc};
use sea_orm::*;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::dto::{AudioSummary, HistoryGroup, HistoryItem, OwnerInfo, RecentlyPlayed};
use crate::models::{audios, history_entries};
use crate::services::audio_service::{AudioService, summary_columns};
use crate::utils::pagination::PaginationQuery;

pub const RECENTLY_PLAYED_LIMIT: u64 = 10;
pub const LISTENED_CATEGORIES_DAYS: i64 = 30;

#[derive(Debug, FromQueryResult)]
struct HistoryRow {
    id: Uuid,
    audio_id: Uuid,
    title: String,
    date: DateTime<Utc>,
}

#[derive(Debug, FromQueryResult)]
struct RecentRow {
    id: Uuid,
    title: String,
    about: String,
    category: String,
    file_url: String,
    poster_url: Option<String>,
    owner_id: Uuid,
    owner_name: String,
    progress: f64,
    date: DateTime<Utc>,
}

impl From<RecentRow> for RecentlyPlayed {
    fn from(row: RecentRow) -> Self {
        RecentlyPlayed {
            audio: AudioSummary {
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
            },
            progress: row.progress,
            date: row.date,
        }
    }
}

/// Bornes [début, fin) du jour UTC contenant `date`
fn day_bounds(date: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(date);
    (start, start + Duration::days(1))
}

/// Regroupe des lignes déjà triées par date décroissante en jours
fn group_by_day(rows: Vec<HistoryRow>) -> Vec<HistoryGroup> {
    rows.chunk_by(|a, b| a.date.date_naive() == b.date.date_naive())
        .map(|day| HistoryGroup {
            date: day[0].date.format("%Y-%m-%d").to_string(),
            audios: day
                .iter()
                .map(|row| HistoryItem {
                    id: row.id,
                    audio_id: row.audio_id,
                    title: row.title.clone(),
                    date: row.date,
                })
                .collect(),
        })
        .collect()
}

pub struct HistoryService;

impl HistoryService {
    pub async fn record(
        db: &DatabaseConnection,
        owner_id: Uuid,
        audio_id: Uuid,
        progress: f64,
        date: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        if !AudioService::exists(db, audio_id).await? {
            return Err(ApiError::not_found("Record not found!"));
        }

        let (day_start, day_end) = day_bounds(date);
        let same_day = history_entries::Entity::find()
            .filter(history_entries::Column::OwnerId.eq(owner_id))
            .filter(history_entries::Column::AudioId.eq(audio_id))
            .filter(history_entries::Column::Date.gte(day_start))
            .filter(history_entries::Column::Date.lt(day_end))
            .one(db)
            .await?;

        match same_day {
            Some(entry) => {
                let mut active: history_entries::ActiveModel = entry.into();
                active.progress = Set(progress);
                active.date = Set(date);
                active.update(db).await?;
            }
            None => {
                history_entries::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    owner_id: Set(owner_id),
                    audio_id: Set(audio_id),
                    progress: Set(progress),
                    date: Set(date),
                    created_at: Set(Utc::now()),
                }
                .insert(db)
                .await?;
            }
        }

        Ok(())
    }

    /// Supprime les entrées données (seulement celles de owner_id)
    pub async fn remove(db: &DatabaseConnection, owner_id: Uuid, ids: &[Uuid]) -> Result<u64, DbErr> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = history_entries::Entity::delete_many()
            .filter(history_entries::Column::OwnerId.eq(owner_id))
            .filter(history_entries::Column::Id.is_in(ids.iter().copied()))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn remove_all(db: &DatabaseConnection, owner_id: Uuid) -> Result<u64, DbErr> {
        let result = history_entries::Entity::delete_many()
            .filter(history_entries::Column::OwnerId.eq(owner_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Historique paginé (par entrée), regroupé par jour, plus récent d'abord
    pub async fn grouped(
        db: &DatabaseConnection,
        owner_id: Uuid,
        page: &PaginationQuery,
    ) -> Result<Vec<HistoryGroup>, DbErr> {
        let rows = history_entries::Entity::find()
            .select_only()
            .column(history_entries::Column::Id)
            .column(history_entries::Column::AudioId)
            .column_as(audios::Column::Title, "title")
            .column(history_entries::Column::Date)
            .join(JoinType::InnerJoin, history_entries::Relation::Audio.def())
            .filter(history_entries::Column::OwnerId.eq(owner_id))
            .order_by_desc(history_entries::Column::Date)
            .offset(page.offset())
            .limit(page.limit())
            .into_model::<HistoryRow>()
            .all(db)
            .await?;

        Ok(group_by_day(rows))
    }

    pub async fn recently_played(db: &DatabaseConnection, owner_id: Uuid) -> Result<Vec<RecentlyPlayed>, DbErr> {
        let rows = summary_columns(history_entries::Entity::find())
            .column(history_entries::Column::Progress)
            .column(history_entries::Column::Date)
            .join(JoinType::InnerJoin, history_entries::Relation::Audio.def())
            .join(JoinType::InnerJoin, audios::Relation::Owner.def())
            .filter(history_entries::Column::OwnerId.eq(owner_id))
            .order_by_desc(history_entries::Column::Date)
            .limit(RECENTLY_PLAYED_LIMIT)
            .into_model::<RecentRow>()
            .all(db)
            .await?;

        Ok(rows.into_iter().map(RecentlyPlayed::from).collect())
    }

    /// Catégories des audios écoutés depuis LISTENED_CATEGORIES_DAYS jours
    pub async fn listened_categories(db: &DatabaseConnection, owner_id: Uuid) -> Result<Vec<String>, DbErr> {
        let since = Utc::now() - Duration::days(LISTENED_CATEGORIES_DAYS);

        history_entries::Entity::find()
            .select_only()
            .column(audios::Column::Category)
            .distinct()
            .join(JoinType::InnerJoin, history_entries::Relation::Audio.def())
            .filter(history_entries::Column::OwnerId.eq(owner_id))
            .filter(history_entries::Column::Date.gte(since))
            .into_tuple::<String>()
            .all(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_audio, seed_user, test_db};
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_day_bounds() {
        let (start, end) = day_bounds(at(2024, 5, 1, 15));
        assert_eq!(start, at(2024, 5, 1, 0));
        assert_eq!(end, at(2024, 5, 2, 0));
    }

    #[actix_web::test]
    async fn test_same_day_updates_instead_of_inserting() {
        let db = test_db().await;
        let (alice, _) = seed_user(&db, "Alice", "a@x.com", true).await;
        let audio = seed_audio(&db, alice.id, "Song", "Music").await;

        HistoryService::record(&db, alice.id, audio.id, 10.0, at(2024, 5, 1, 9)).await.unwrap();
        HistoryService::record(&db, alice.id, audio.id, 42.0, at(2024, 5, 1, 18)).await.unwrap();
        HistoryService::record(&db, alice.id, audio.id, 5.0, at(2024, 5, 2, 8)).await.unwrap();

        let entries = history_entries::Entity::find()
            .filter(history_entries::Column::OwnerId.eq(alice.id))
            .order_by_asc(history_entries::Column::Date)
            .all(&db)
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].progress, 42.0);
    }

    #[actix_web::test]
    async fn test_grouped_by_day_newest_first() {
        let db = test_db().await;
        let (alice, _) = seed_user(&db, "Alice", "a@x.com", true).await;
        let first = seed_audio(&db, alice.id, "One", "Music").await;
        let second = seed_audio(&db, alice.id, "Two", "Tech").await;

        HistoryService::record(&db, alice.id, first.id, 1.0, at(2024, 5, 1, 9)).await.unwrap();
        HistoryService::record(&db, alice.id, second.id, 1.0, at(2024, 5, 1, 10)).await.unwrap();
        HistoryService::record(&db, alice.id, first.id, 1.0, at(2024, 5, 3, 10)).await.unwrap();

        let groups = HistoryService::grouped(&db, alice.id, &PaginationQuery::default())
            .await
            .unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date, "2024-05-03");
        assert_eq!(groups[1].date, "2024-05-01");
        assert_eq!(groups[1].audios.len(), 2);
        assert_eq!(groups[1].audios[0].title, "Two");
    }

    #[actix_web::test]
    async fn test_remove_only_touches_own_entries() {
        let db = test_db().await;
        let (alice, _) = seed_user(&db, "Alice", "a@x.com", true).await;
        let (bob, _) = seed_user(&db, "Bob", "b@x.com", true).await;
        let audio = seed_audio(&db, alice.id, "Song", "Music").await;

        HistoryService::record(&db, alice.id, audio.id, 1.0, at(2024, 5, 1, 9)).await.unwrap();
        HistoryService::record(&db, bob.id, audio.id, 1.0, at(2024, 5, 1, 9)).await.unwrap();

        let alice_entry = history_entries::Entity::find()
            .filter(history_entries::Column::OwnerId.eq(alice.id))
            .one(&db)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(HistoryService::remove(&db, bob.id, &[alice_entry.id]).await.unwrap(), 0);
        assert_eq!(HistoryService::remove(&db, alice.id, &[alice_entry.id]).await.unwrap(), 1);
        assert_eq!(HistoryService::remove_all(&db, bob.id).await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn test_recent_plays_and_categories() {
        let db = test_db().await;
        let (alice, _) = seed_user(&db, "Alice", "a@x.com", true).await;
        let song = seed_audio(&db, alice.id, "Song", "Music").await;
        let talk = seed_audio(&db, alice.id, "Talk", "Tech").await;
        let old = seed_audio(&db, alice.id, "Lesson", "Education").await;

        let now = Utc::now();
        HistoryService::record(&db, alice.id, song.id, 12.5, now - Duration::hours(1)).await.unwrap();
        HistoryService::record(&db, alice.id, talk.id, 3.0, now - Duration::days(2)).await.unwrap();
        HistoryService::record(&db, alice.id, old.id, 3.0, now - Duration::days(45)).await.unwrap();

        let recent = HistoryService::recently_played(&db, alice.id).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].audio.id, song.id);
        assert_eq!(recent[0].progress, 12.5);

        let mut categories = HistoryService::listened_categories(&db, alice.id).await.unwrap();
        categories.sort();
        assert_eq!(categories, vec!["Music".to_string(), "Tech".to_string()]);
    }
}

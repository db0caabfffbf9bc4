// connexion BD + création du schéma

use sea_orm::sea_query::{Index, IntoIden};
use sea_orm::{
    ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityName, EntityTrait, Schema,
    SqlErr,
};

use crate::models::{
    audios, email_verification_tokens, favorites, follows, history_entries,
    password_reset_tokens, playlist_items, playlists, session_tokens, users,
};

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Crée les tables manquantes à partir des entités (ordre imposé par les FK)
pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, users::Entity).await?;
    create_table(db, session_tokens::Entity).await?;
    create_table(db, email_verification_tokens::Entity).await?;
    create_table(db, password_reset_tokens::Entity).await?;
    create_table(db, audios::Entity).await?;
    create_table(db, favorites::Entity).await?;
    create_table(db, playlists::Entity).await?;
    create_table(db, playlist_items::Entity).await?;
    create_table(db, history_entries::Entity).await?;
    create_table(db, follows::Entity).await?;

    // Une seule ligne par paire: les bascules concurrentes ne peuvent pas dédoubler
    create_unique_pair(
        db,
        "idx_favorites_owner_audio",
        favorites::Entity,
        favorites::Column::OwnerId,
        favorites::Column::AudioId,
    )
    .await?;
    create_unique_pair(
        db,
        "idx_playlist_items_playlist_audio",
        playlist_items::Entity,
        playlist_items::Column::PlaylistId,
        playlist_items::Column::AudioId,
    )
    .await?;
    create_unique_pair(
        db,
        "idx_follows_follower_followee",
        follows::Entity,
        follows::Column::FollowerId,
        follows::Column::FolloweeId,
    )
    .await?;
    Ok(())
}

/// Insertion refusée par un index unique: la ligne existe déjà
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();

    db.execute(backend.build(&statement)).await?;
    Ok(())
}

async fn create_unique_pair<E, C>(
    db: &DatabaseConnection,
    name: &str,
    entity: E,
    first: C,
    second: C,
) -> Result<(), DbErr>
where
    E: EntityTrait,
    C: ColumnTrait + IntoIden,
{
    let statement = Index::create()
        .name(name)
        .table(entity.table_ref())
        .col(first)
        .col(second)
        .unique()
        .if_not_exists()
        .to_owned();

    db.execute(db.get_database_backend().build(&statement)).await?;
    Ok(())
}

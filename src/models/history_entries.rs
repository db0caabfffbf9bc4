// ============================================================================
// MODÈLE : HISTORY ENTRIES
// ============================================================================
//
// Description:
//   Historique d'écoute. Une ligne par (audio, jour) et par utilisateur :
//   réécouter le même audio le même jour met à jour progress/date au lieu
//   d'ajouter une ligne.
//
// Colonnes:
//   - progress (DOUBLE) - position de lecture envoyée par le client
//   - date (TIMESTAMP) - date d'écoute envoyée par le client (sert au regroupement par jour)
//
// ============================================================================

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "history_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub audio_id: Uuid,
    pub progress: f64,
    pub date: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,

    #[sea_orm(
        belongs_to = "super::audios::Entity",
        from = "Column::AudioId",
        to = "super::audios::Column::Id",
        on_delete = "Cascade"
    )]
    Audio,
}

impl Related<super::audios::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Audio.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

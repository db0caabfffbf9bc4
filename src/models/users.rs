use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)] // Ne jamais exposer le hash en JSON
    pub password_hash: String, // Format PHC: $pbkdf2-sha256$i=...,l=32$salt$hash
    pub verified: bool,
    pub avatar_url: Option<String>,
    pub avatar_public_id: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::audios::Entity")]
    Audio,

    #[sea_orm(has_many = "super::session_tokens::Entity")]
    SessionToken,
}

impl Related<super::audios::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Audio.def()
    }
}

impl Related<super::session_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SessionToken.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

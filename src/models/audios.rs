use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

/// Catégories acceptées pour un upload
pub const CATEGORIES: [&str; 9] = [
    "Arts",
    "Business",
    "Education",
    "Entertainment",
    "Kids & Family",
    "Music",
    "Science",
    "Tech",
    "Others",
];

pub fn is_valid_category(category: &str) -> bool {
    CATEGORIES.contains(&category)
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audios")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub about: String,
    pub category: String, // une des CATEGORIES
    pub file_url: String,
    pub file_public_id: String,
    pub poster_url: Option<String>,
    pub poster_public_id: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

// Pas de colonne "likes": les likes d'un audio sont les lignes favorites qui le référencent
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,

    #[sea_orm(has_many = "super::favorites::Entity")]
    Favorites,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::favorites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorites.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

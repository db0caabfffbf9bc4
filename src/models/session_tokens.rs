// ============================================================================
// MODÈLE : SESSION TOKENS
// ============================================================================
//
// Description:
//   Liste des tokens de session actifs d'un utilisateur (un par appareil).
//   Un JWT n'authentifie que tant que son empreinte SHA-256 est présente ici.
//
// Workflow:
//   1. POST /auth/sign-in → insertion d'une ligne
//   2. Chaque requête protégée → recherche par token_hash
//   3. POST /auth/log-out → suppression de la ligne (ou de toutes avec fromAll=yes)
//
// ============================================================================

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "session_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    #[sea_orm(unique)]
    pub token_hash: String,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

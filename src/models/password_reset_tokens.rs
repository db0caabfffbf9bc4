// ============================================================================
// MODÈLE : PASSWORD RESET TOKENS
// ============================================================================
//
// Colonnes:
//   - id (UUID, PRIMARY KEY)
//   - user_id (UUID, NOT NULL, FK vers users)
//   - token_hash (VARCHAR, NOT NULL) - hash PHC du token hex (32 octets aléatoires)
//   - expires_at (TIMESTAMP, NOT NULL) - created_at + 1 heure
//   - created_at (TIMESTAMP)
//
// Workflow:
//   1. User demande reset via POST /auth/forget-password { email }
//   2. Backend supprime l'ancien token, en génère un nouveau et stocke son hash
//   3. Backend envoie un lien ?token=...&userId=...
//   4. La page de reset appelle POST /auth/verify-pass-reset-token
//   5. Puis POST /auth/update-password { userId, token, password }
//   6. Backend change le password et supprime le token
//
// ============================================================================

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "password_reset_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    pub token_hash: String,

    pub expires_at: DateTimeUtc,

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

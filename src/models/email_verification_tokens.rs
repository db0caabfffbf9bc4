// ============================================================================
// MODÈLE : EMAIL VERIFICATION TOKENS
// ============================================================================
//
// Colonnes:
//   - id (UUID, PRIMARY KEY)
//   - user_id (UUID, NOT NULL, FK vers users)
//   - token_hash (VARCHAR, NOT NULL) - hash PHC de l'OTP à 6 chiffres
//   - expires_at (TIMESTAMP, NOT NULL) - created_at + 1 heure
//   - created_at (TIMESTAMP)
//
// Workflow:
//   1. User s'inscrit via POST /auth/create (ou redemande via /auth/re-verify-email)
//   2. Backend supprime l'ancien token, génère un OTP et stocke son hash
//   3. Backend envoie l'OTP par email
//   4. Client appelle POST /auth/verify-email avec { userId, token }
//   5. Backend vérifie: token existe, pas expiré, hash correspond
//   6. Backend met users.verified = true puis supprime le token
//
// Points d'attention:
//   - Un mauvais OTP ne supprime PAS le token
//   - Les tokens expirés sont ignorés à la lecture et purgés par cleanup_service
//
// ============================================================================

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "email_verification_tokens")]
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

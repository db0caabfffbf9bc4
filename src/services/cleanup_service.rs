use chrono::Utc;
use sea_orm::*;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::models::{email_verification_tokens, password_reset_tokens};

pub struct CleanupService;

impl CleanupService {
    /// Supprime les tokens à usage unique expirés, renvoie le nombre de lignes supprimées
    pub async fn purge_expired_tokens(db: &DatabaseConnection) -> Result<u64, DbErr> {
        let now = Utc::now();

        let verification = email_verification_tokens::Entity::delete_many()
            .filter(email_verification_tokens::Column::ExpiresAt.lte(now))
            .exec(db)
            .await?;

        let reset = password_reset_tokens::Entity::delete_many()
            .filter(password_reset_tokens::Column::ExpiresAt.lte(now))
            .exec(db)
            .await?;

        Ok(verification.rows_affected + reset.rows_affected)
    }

    /// Lance la purge périodique en tâche de fond
    pub fn spawn(db: DatabaseConnection, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                match Self::purge_expired_tokens(&db).await {
                    Ok(0) => {}
                    Ok(removed) => tracing::info!(removed, "expired tokens purged"),
                    Err(e) => tracing::error!(error = %e, "token cleanup failed"),
                }
            }
        })
    }
}

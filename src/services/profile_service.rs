use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::db::is_unique_violation;
use crate::error::ApiError;
use crate::models::dto::{Profile, PublicProfile, ToggleStatus};
use crate::models::{follows, users};

pub struct ProfileService;

impl ProfileService {
    /// (followers, followings) d'un utilisateur
    pub async fn follow_counts(db: &DatabaseConnection, user_id: Uuid) -> Result<(u64, u64), DbErr> {
        let followers = follows::Entity::find()
            .filter(follows::Column::FolloweeId.eq(user_id))
            .count(db)
            .await?;

        let followings = follows::Entity::find()
            .filter(follows::Column::FollowerId.eq(user_id))
            .count(db)
            .await?;

        Ok((followers, followings))
    }

    /// Projection principal/profil privé (avec email et compteurs)
    pub async fn profile_of(db: &DatabaseConnection, user: &users::Model) -> Result<Profile, DbErr> {
        let (followers, followings) = Self::follow_counts(db, user.id).await?;
        Ok(Profile::from_user(user, followers, followings))
    }

    pub async fn public_profile(db: &DatabaseConnection, user_id: Uuid) -> Result<PublicProfile, ApiError> {
        let user = users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Profile not found!"))?;

        let (followers, followings) = Self::follow_counts(db, user.id).await?;

        Ok(PublicProfile {
            id: user.id,
            name: user.name,
            avatar: user.avatar_url,
            followers,
            followings,
        })
    }

    /// Suivre / ne plus suivre un profil
    pub async fn toggle_follow(
        db: &DatabaseConnection,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> Result<ToggleStatus, ApiError> {
        if follower_id == followee_id {
            return Err(ApiError::validation("You cannot follow yourself!"));
        }

        let followee = users::Entity::find_by_id(followee_id).one(db).await?;
        if followee.is_none() {
            return Err(ApiError::not_found("Profile not found!"));
        }

        let existing = follows::Entity::find()
            .filter(follows::Column::FollowerId.eq(follower_id))
            .filter(follows::Column::FolloweeId.eq(followee_id))
            .one(db)
            .await?;

        match existing {
            Some(follow) => {
                follows::Entity::delete_by_id(follow.id).exec(db).await?;
                Ok(ToggleStatus::Removed)
            }
            None => {
                Self::insert_follow(db, follower_id, followee_id).await?;
                Ok(ToggleStatus::Added)
            }
        }
    }

    /// Paire déjà présente (bascule concurrente): rien à ajouter
    async fn insert_follow(db: &DatabaseConnection, follower_id: Uuid, followee_id: Uuid) -> Result<(), DbErr> {
        let inserted = follows::ActiveModel {
            id: Set(Uuid::new_v4()),
            follower_id: Set(follower_id),
            followee_id: Set(followee_id),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await;

        match inserted {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

//! SeaORM implementation of RelationshipRepository

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};

use crate::domain::{DomainError, FollowCounts, RelationshipRepository, User};
use crate::models::relationship::{ActiveModel, Column, Entity as RelationshipEntity, ToFollowed, ToFollower};

/// SeaORM-based implementation of RelationshipRepository
pub struct SeaOrmRelationshipRepository {
    db: DatabaseConnection,
}

impl SeaOrmRelationshipRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RelationshipRepository for SeaOrmRelationshipRepository {
    async fn follow(&self, follower_id: i32, followed_id: i32) -> Result<bool, DomainError> {
        if follower_id == followed_id {
            return Err(DomainError::invalid("followed_id", "can't be yourself"));
        }

        let edge = ActiveModel {
            follower_id: Set(follower_id),
            followed_id: Set(followed_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let result = RelationshipEntity::insert(edge)
            .on_conflict(
                OnConflict::columns([Column::FollowerId, Column::FollowedId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&self.db)
            .await;

        match result {
            Ok(_) => Ok(true),
            // The pair already exists
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn unfollow(&self, follower_id: i32, followed_id: i32) -> Result<bool, DomainError> {
        let result = RelationshipEntity::delete_many()
            .filter(Column::FollowerId.eq(follower_id))
            .filter(Column::FollowedId.eq(followed_id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn is_following(&self, follower_id: i32, followed_id: i32) -> Result<bool, DomainError> {
        let count = RelationshipEntity::find()
            .filter(Column::FollowerId.eq(follower_id))
            .filter(Column::FollowedId.eq(followed_id))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    async fn followings(&self, user_id: i32) -> Result<Vec<User>, DomainError> {
        let rows = RelationshipEntity::find()
            .filter(Column::FollowerId.eq(user_id))
            .order_by_asc(Column::Id)
            .find_also_linked(ToFollowed)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(_, user)| user.map(User::from))
            .collect())
    }

    async fn followers(&self, user_id: i32) -> Result<Vec<User>, DomainError> {
        let rows = RelationshipEntity::find()
            .filter(Column::FollowedId.eq(user_id))
            .order_by_asc(Column::Id)
            .find_also_linked(ToFollower)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(_, user)| user.map(User::from))
            .collect())
    }

    async fn counts(&self, user_id: i32) -> Result<FollowCounts, DomainError> {
        let followings = RelationshipEntity::find()
            .filter(Column::FollowerId.eq(user_id))
            .count(&self.db)
            .await?;
        let followers = RelationshipEntity::find()
            .filter(Column::FollowedId.eq(user_id))
            .count(&self.db)
            .await?;

        Ok(FollowCounts {
            followings,
            followers,
        })
    }
}

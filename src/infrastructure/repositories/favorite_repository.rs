//! SeaORM implementation of FavoriteRepository

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, Set};

use crate::domain::{DomainError, FavoriteRepository};
use crate::models::favorite::{ActiveModel, Column, Entity as FavoriteEntity};

/// SeaORM-based implementation of FavoriteRepository
pub struct SeaOrmFavoriteRepository {
    db: DatabaseConnection,
}

impl SeaOrmFavoriteRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FavoriteRepository for SeaOrmFavoriteRepository {
    async fn favorite(&self, user_id: i32, book_id: i32) -> Result<bool, DomainError> {
        let model = ActiveModel {
            user_id: Set(user_id),
            book_id: Set(book_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let result = FavoriteEntity::insert(model)
            .on_conflict(
                OnConflict::columns([Column::UserId, Column::BookId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&self.db)
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn unfavorite(&self, user_id: i32, book_id: i32) -> Result<bool, DomainError> {
        let result = FavoriteEntity::delete_many()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::BookId.eq(book_id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn is_favorited(&self, user_id: i32, book_id: i32) -> Result<bool, DomainError> {
        let count = FavoriteEntity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::BookId.eq(book_id))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    async fn count_for_book(&self, book_id: i32) -> Result<u64, DomainError> {
        let count = FavoriteEntity::find()
            .filter(Column::BookId.eq(book_id))
            .count(&self.db)
            .await?;

        Ok(count)
    }
}

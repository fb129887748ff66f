//! SeaORM implementation of BookCommentRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::{BookComment, BookCommentRepository, DomainError};
use crate::models::book_comment::{ActiveModel, Column, Entity as BookCommentEntity};

/// SeaORM-based implementation of BookCommentRepository
pub struct SeaOrmBookCommentRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookCommentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookCommentRepository for SeaOrmBookCommentRepository {
    async fn find_by_book(&self, book_id: i32) -> Result<Vec<BookComment>, DomainError> {
        let comments = BookCommentEntity::find()
            .filter(Column::BookId.eq(book_id))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?;

        Ok(comments.into_iter().map(BookComment::from).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<BookComment>, DomainError> {
        let comment = BookCommentEntity::find_by_id(id).one(&self.db).await?;
        Ok(comment.map(BookComment::from))
    }

    async fn create(
        &self,
        user_id: i32,
        book_id: i32,
        comment: String,
    ) -> Result<BookComment, DomainError> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = ActiveModel {
            user_id: Set(user_id),
            book_id: Set(book_id),
            comment: Set(comment),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await?;
        Ok(BookComment::from(result))
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        let result = BookCommentEntity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound);
        }

        Ok(())
    }
}

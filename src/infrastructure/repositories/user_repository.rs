//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

use crate::domain::search::{Filter, Predicate, SortDirection, SortKey, UserAttribute};
use crate::domain::validation::TAKEN;
use crate::domain::{
    DomainError, NewUser, ProfileChanges, User, UserCredentials, UserQuery, UserRepository,
};
use crate::models::user::{ActiveModel, Column, Entity as UserEntity};
use crate::models::{book, book_comment, favorite, relationship};

/// SeaORM-based implementation of UserRepository
pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Turn a UNIQUE violation on users into the matching field error
fn map_unique_violation(e: DbErr) -> DomainError {
    if let Some(SqlErr::UniqueConstraintViolation(message)) = e.sql_err() {
        let field = if message.contains("email") { "email" } else { "name" };
        return DomainError::invalid(field, TAKEN);
    }
    e.into()
}

/// `%` and `_` in user input match themselves
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn like<C: ColumnTrait>(column: C, pattern: String) -> SimpleExpr {
    Expr::col((column.entity_name(), column)).like(LikeExpr::new(pattern).escape('\\'))
}

/// Apply a text predicate to any column; values are always bound parameters
pub(crate) fn text_predicate<C: ColumnTrait>(column: C, predicate: Predicate, value: &str) -> SimpleExpr {
    match predicate {
        Predicate::Eq => column.eq(value),
        Predicate::NotEq => column.ne(value),
        Predicate::Cont => like(column, format!("%{}%", escape_like(value))),
        Predicate::Start => like(column, format!("{}%", escape_like(value))),
        Predicate::End => like(column, format!("%{}", escape_like(value))),
    }
}

fn filter_expr(filter: &Filter<UserAttribute>) -> SimpleExpr {
    let column = match filter.attribute {
        UserAttribute::Name => Column::Name,
        UserAttribute::Introduction => Column::Introduction,
    };
    text_predicate(column, filter.predicate, &filter.value)
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn find_all(&self) -> Result<Vec<User>, DomainError> {
        let users = UserEntity::find()
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?;

        Ok(users.into_iter().map(User::from).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, DomainError> {
        let user = UserEntity::find_by_id(id).one(&self.db).await?;
        Ok(user.map(User::from))
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, DomainError> {
        let user = UserEntity::find()
            .filter(Column::Email.eq(email))
            .one(&self.db)
            .await?;

        Ok(user.map(|model| UserCredentials {
            password_hash: model.password_hash.clone(),
            user: User::from(model),
        }))
    }

    async fn search(&self, query: UserQuery) -> Result<Vec<User>, DomainError> {
        let condition = query
            .filters
            .iter()
            .fold(Condition::all(), |cond, filter| cond.add(filter_expr(filter)));

        let mut select = UserEntity::find().filter(condition);

        select = match query.sort {
            Some((SortKey::Name, SortDirection::Asc)) => select.order_by_asc(Column::Name),
            Some((SortKey::Name, SortDirection::Desc)) => select.order_by_desc(Column::Name),
            Some((SortKey::CreatedAt, SortDirection::Asc)) => select.order_by_asc(Column::CreatedAt),
            Some((SortKey::CreatedAt, SortDirection::Desc)) => {
                select.order_by_desc(Column::CreatedAt)
            }
            None => select,
        };

        let users = select.order_by_asc(Column::Id).all(&self.db).await?;
        Ok(users.into_iter().map(User::from).collect())
    }

    async fn name_taken(&self, name: &str, except: Option<i32>) -> Result<bool, DomainError> {
        let mut query = UserEntity::find().filter(Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    async fn email_taken(&self, email: &str) -> Result<bool, DomainError> {
        let count = UserEntity::find()
            .filter(Column::Email.eq(email))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn create(&self, user: NewUser) -> Result<User, DomainError> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = ActiveModel {
            name: Set(user.name),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            role: Set(user.role),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(map_unique_violation)?;
        Ok(User::from(result))
    }

    async fn update_profile(&self, id: i32, changes: ProfileChanges) -> Result<User, DomainError> {
        let existing = UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let mut active: ActiveModel = existing.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(introduction) = changes.introduction {
            active.introduction = Set(introduction);
        }
        if let Some(profile_image) = changes.profile_image {
            active.profile_image = Set(profile_image);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let result = active.update(&self.db).await.map_err(map_unique_violation)?;
        Ok(User::from(result))
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;

        let user = UserEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(DomainError::NotFound)?;

        let book_ids: Vec<i32> = book::Entity::find()
            .select_only()
            .column(book::Column::Id)
            .filter(book::Column::UserId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;

        // Comments and favorites written by the user or attached to their books
        book_comment::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(book_comment::Column::UserId.eq(id))
                    .add(book_comment::Column::BookId.is_in(book_ids.clone())),
            )
            .exec(&txn)
            .await?;

        favorite::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(favorite::Column::UserId.eq(id))
                    .add(favorite::Column::BookId.is_in(book_ids)),
            )
            .exec(&txn)
            .await?;

        book::Entity::delete_many()
            .filter(book::Column::UserId.eq(id))
            .exec(&txn)
            .await?;

        // Both directions of the follow graph
        relationship::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(relationship::Column::FollowerId.eq(id))
                    .add(relationship::Column::FollowedId.eq(id)),
            )
            .exec(&txn)
            .await?;

        user.delete(&txn).await?;
        txn.commit().await?;

        Ok(())
    }
}

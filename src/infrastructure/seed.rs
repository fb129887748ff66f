use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::auth::hash_password;
use crate::domain::ROLE_USER;
use crate::models::{book, relationship, user};

const DEMO_PASSWORD: &str = "password";

const DEMO_USERS: [(&str, &str, &str); 3] = [
    ("alice", "alice@example.com", "Reads mostly fantasy."),
    ("bob", "bob@example.com", "Science fiction and history."),
    ("carol", "carol@example.com", "Poetry on weekends."),
];

const DEMO_BOOKS: [(&str, &str, &str); 4] = [
    ("alice@example.com", "The Hobbit", "A comfortable journey there and back again."),
    ("alice@example.com", "Earthsea", "Names have power."),
    ("bob@example.com", "Foundation", "Psychohistory against the long dark age."),
    ("carol@example.com", "Leaves of Grass", "Long lines, wide skies."),
];

/// (follower, followed)
const DEMO_FOLLOWS: [(&str, &str); 3] = [
    ("alice@example.com", "bob@example.com"),
    ("bob@example.com", "alice@example.com"),
    ("carol@example.com", "alice@example.com"),
];

async fn user_id(db: &DatabaseConnection, email: &str) -> Result<i32, DbErr> {
    user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?
        .map(|u| u.id)
        .ok_or_else(|| DbErr::RecordNotFound(format!("demo user {}", email)))
}

/// Insert demo users, books and follows. Safe to run more than once.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    let now = chrono::Utc::now().to_rfc3339();
    let password_hash = hash_password(DEMO_PASSWORD).map_err(DbErr::Custom)?;

    // 1. Users
    for (name, email, introduction) in DEMO_USERS {
        let model = user::ActiveModel {
            name: Set(name.to_owned()),
            email: Set(email.to_owned()),
            password_hash: Set(password_hash.clone()),
            introduction: Set(Some(introduction.to_owned())),
            profile_image: Set(None),
            role: Set(ROLE_USER.to_owned()),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        };

        user::Entity::insert(model)
            .on_conflict(
                OnConflict::column(user::Column::Email)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
    }

    // 2. Books, only for users that have none yet
    for (email, title, body) in DEMO_BOOKS {
        let owner = user_id(db, email).await?;
        let exists = book::Entity::find()
            .filter(book::Column::UserId.eq(owner))
            .filter(book::Column::Title.eq(title))
            .count(db)
            .await?
            > 0;
        if exists {
            continue;
        }

        book::ActiveModel {
            user_id: Set(owner),
            title: Set(title.to_owned()),
            body: Set(body.to_owned()),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    // 3. Follows
    for (follower, followed) in DEMO_FOLLOWS {
        let edge = relationship::ActiveModel {
            follower_id: Set(user_id(db, follower).await?),
            followed_id: Set(user_id(db, followed).await?),
            created_at: Set(now.clone()),
            ..Default::default()
        };

        relationship::Entity::insert(edge)
            .on_conflict(
                OnConflict::columns([
                    relationship::Column::FollowerId,
                    relationship::Column::FollowedId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
    }

    tracing::info!("Seeded {} demo users", DEMO_USERS.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;

    #[tokio::test]
    async fn test_seed_is_repeatable() {
        let db = init_db("sqlite::memory:").await.unwrap();

        seed_demo_data(&db).await.unwrap();
        seed_demo_data(&db).await.unwrap();

        assert_eq!(user::Entity::find().count(&db).await.unwrap(), 3);
        assert_eq!(book::Entity::find().count(&db).await.unwrap(), 4);
        assert_eq!(relationship::Entity::find().count(&db).await.unwrap(), 3);
    }
}

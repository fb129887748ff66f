//! Application state containing repositories and shared resources

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::{
    BookCommentRepository, BookRepository, FavoriteRepository, RelationshipRepository,
    UserRepository,
};
use crate::infrastructure::config::Config;
use crate::infrastructure::storage::DiskStorage;
use crate::infrastructure::{
    SeaOrmBookCommentRepository, SeaOrmBookRepository, SeaOrmFavoriteRepository,
    SeaOrmRelationshipRepository, SeaOrmUserRepository,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    db: DatabaseConnection,
    /// User repository
    pub user_repo: Arc<dyn UserRepository>,
    /// Follow graph repository
    pub relationship_repo: Arc<dyn RelationshipRepository>,
    /// Book repository
    pub book_repo: Arc<dyn BookRepository>,
    /// Book comment repository
    pub comment_repo: Arc<dyn BookCommentRepository>,
    /// Favorite repository
    pub favorite_repo: Arc<dyn FavoriteRepository>,
    /// Profile image blobs
    pub storage: Arc<DiskStorage>,
    /// Public path of the fallback profile image
    pub default_profile_image: Arc<str>,
}

impl AppState {
    /// Create a new AppState with all repositories initialized
    pub fn new(db: DatabaseConnection, config: &Config) -> Self {
        Self {
            user_repo: Arc::new(SeaOrmUserRepository::new(db.clone())),
            relationship_repo: Arc::new(SeaOrmRelationshipRepository::new(db.clone())),
            book_repo: Arc::new(SeaOrmBookRepository::new(db.clone())),
            comment_repo: Arc::new(SeaOrmBookCommentRepository::new(db.clone())),
            favorite_repo: Arc::new(SeaOrmFavoriteRepository::new(db.clone())),
            storage: Arc::new(DiskStorage::new(config.storage_dir.clone())),
            default_profile_image: Arc::from(config.default_profile_image.as_str()),
            db,
        }
    }
}

// Implement FromRef to allow extracting DatabaseConnection from AppState
impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

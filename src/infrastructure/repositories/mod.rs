//! Repository implementations using SeaORM

pub mod book_comment_repository;
pub mod book_repository;
pub mod favorite_repository;
pub mod relationship_repository;
pub mod user_repository;

pub use book_comment_repository::SeaOrmBookCommentRepository;
pub use book_repository::SeaOrmBookRepository;
pub use favorite_repository::SeaOrmFavoriteRepository;
pub use relationship_repository::SeaOrmRelationshipRepository;
pub use user_repository::SeaOrmUserRepository;

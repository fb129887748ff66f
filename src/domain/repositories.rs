//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;

use super::DomainError;
use super::search::{BookQuery, UserQuery};

/// User data as handed to the API layer
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub introduction: Option<String>,
    /// Storage key of the attached profile image, if any
    pub profile_image: Option<String>,
    pub role: String,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn is_guest(&self) -> bool {
        self.role == ROLE_GUEST
    }
}

pub const ROLE_USER: &str = "user";
pub const ROLE_GUEST: &str = "guest";

/// Credentials row used only by sign-in
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

/// Allow-listed profile changes. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub introduction: Option<Option<String>>,
    pub profile_image: Option<Option<String>>,
}

/// Repository trait for User entity
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find all users, oldest first
    async fn find_all(&self) -> Result<Vec<User>, DomainError>;

    /// Find a user by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, DomainError>;

    /// Find a user and password hash by email
    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, DomainError>;

    /// Find users matching a structured query
    async fn search(&self, query: UserQuery) -> Result<Vec<User>, DomainError>;

    /// Whether `name` belongs to a user other than `except`
    async fn name_taken(&self, name: &str, except: Option<i32>) -> Result<bool, DomainError>;

    /// Whether `email` is registered already
    async fn email_taken(&self, email: &str) -> Result<bool, DomainError>;

    /// Create a new user
    async fn create(&self, user: NewUser) -> Result<User, DomainError>;

    /// Apply profile changes
    async fn update_profile(&self, id: i32, changes: ProfileChanges) -> Result<User, DomainError>;

    /// Delete a user together with books, comments, favorites and follow edges
    async fn delete(&self, id: i32) -> Result<(), DomainError>;
}

/// Follow-edge counts for one user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct FollowCounts {
    pub followings: u64,
    pub followers: u64,
}

/// Repository trait for the follow graph
#[async_trait]
pub trait RelationshipRepository: Send + Sync {
    /// Create the edge follower -> followed. Returns false if it already existed.
    async fn follow(&self, follower_id: i32, followed_id: i32) -> Result<bool, DomainError>;

    /// Remove the edge follower -> followed. Returns false if there was none.
    async fn unfollow(&self, follower_id: i32, followed_id: i32) -> Result<bool, DomainError>;

    async fn is_following(&self, follower_id: i32, followed_id: i32) -> Result<bool, DomainError>;

    /// Users `user_id` follows
    async fn followings(&self, user_id: i32) -> Result<Vec<User>, DomainError>;

    /// Users following `user_id`
    async fn followers(&self, user_id: i32) -> Result<Vec<User>, DomainError>;

    async fn counts(&self, user_id: i32) -> Result<FollowCounts, DomainError>;
}

/// Book data for API responses
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Book {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating or updating a book
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct BookInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Repository trait for Book entity
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Find all books, newest first
    async fn find_all(&self) -> Result<Vec<Book>, DomainError>;

    /// Books posted by one user, newest first
    async fn find_by_user(&self, user_id: i32) -> Result<Vec<Book>, DomainError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Book>, DomainError>;

    async fn search(&self, query: BookQuery) -> Result<Vec<Book>, DomainError>;

    async fn create(&self, user_id: i32, input: BookInput) -> Result<Book, DomainError>;

    async fn update(&self, id: i32, input: BookInput) -> Result<Book, DomainError>;

    /// Delete a book with its comments and favorites
    async fn delete(&self, id: i32) -> Result<(), DomainError>;
}

/// Comment data for API responses
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BookComment {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub comment: String,
    pub created_at: String,
}

/// Repository trait for BookComment entity
#[async_trait]
pub trait BookCommentRepository: Send + Sync {
    /// Comments on a book, oldest first
    async fn find_by_book(&self, book_id: i32) -> Result<Vec<BookComment>, DomainError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<BookComment>, DomainError>;

    async fn create(
        &self,
        user_id: i32,
        book_id: i32,
        comment: String,
    ) -> Result<BookComment, DomainError>;

    async fn delete(&self, id: i32) -> Result<(), DomainError>;
}

/// Repository trait for Favorite entity
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Returns false if the favorite already existed
    async fn favorite(&self, user_id: i32, book_id: i32) -> Result<bool, DomainError>;

    /// Returns false if there was nothing to remove
    async fn unfavorite(&self, user_id: i32, book_id: i32) -> Result<bool, DomainError>;

    async fn is_favorited(&self, user_id: i32, book_id: i32) -> Result<bool, DomainError>;

    async fn count_for_book(&self, book_id: i32) -> Result<u64, DomainError>;
}

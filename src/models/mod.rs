pub mod book;
pub mod book_comment;
pub mod favorite;
pub mod relationship;
pub mod user;

//! Book handlers. Editing is restricted to the book's author.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;

use super::users::UserResponse;
use super::{error_response, redirect_with_notice};
use crate::auth::CurrentUser;
use crate::domain::validation::{self, ValidationErrors};
use crate::domain::{Book, BookInput, DomainError, User};
use crate::infrastructure::AppState;

pub const CREATE_NOTICE: &str = "You have created book successfully.";
pub const UPDATE_NOTICE: &str = "You have updated book successfully.";

#[derive(Debug, Serialize)]
pub struct BookResponse {
    #[serde(flatten)]
    pub book: Book,
    pub user: Option<UserResponse>,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: i32,
    pub comment: String,
    pub created_at: String,
    pub user: Option<UserResponse>,
}

fn validate(input: &BookInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    validation::validate_book(&mut errors, &input.title, &input.body);
    errors.into_result()
}

fn invalid_form(input: &BookInput, errors: ValidationErrors) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "book": input, "errors": errors })),
    )
        .into_response()
}

async fn find_book(state: &AppState, id: i32) -> Result<Book, DomainError> {
    state
        .book_repo
        .find_by_id(id)
        .await?
        .ok_or(DomainError::NotFound)
}

pub async fn index(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
) -> impl IntoResponse {
    let (books, users) = match (state.book_repo.find_all().await, state.user_repo.find_all().await)
    {
        (Ok(books), Ok(users)) => (books, users),
        (Err(e), _) | (_, Err(e)) => return error_response(e, "Book not found"),
    };

    let authors: HashMap<i32, &User> = users.iter().map(|u| (u.id, u)).collect();
    let books: Vec<BookResponse> = books
        .into_iter()
        .map(|book| BookResponse {
            user: authors
                .get(&book.user_id)
                .map(|u| UserResponse::new(u, &state.default_profile_image)),
            book,
        })
        .collect();

    (
        StatusCode::OK,
        Json(json!({
            "books": books,
            "user": UserResponse::new(&current, &state.default_profile_image),
            "book": BookInput::default(),
        })),
    )
        .into_response()
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Json(input): Json<BookInput>,
) -> impl IntoResponse {
    if let Err(errors) = validate(&input) {
        return invalid_form(&input, errors);
    }

    match state.book_repo.create(current.id, input).await {
        Ok(book) => {
            tracing::info!("User {} posted book {}", current.id, book.id);
            redirect_with_notice(&format!("/books/{}", book.id), Some(CREATE_NOTICE))
        }
        Err(e) => error_response(e, "Book not found"),
    }
}

pub async fn show(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let book = match find_book(&state, id).await {
        Ok(book) => book,
        Err(e) => return error_response(e, "Book not found"),
    };

    let loaded = async {
        let author = state.user_repo.find_by_id(book.user_id).await?;
        let comments = state.comment_repo.find_by_book(id).await?;
        let favorites_count = state.favorite_repo.count_for_book(id).await?;
        let favorited = state.favorite_repo.is_favorited(current.id, id).await?;
        let mut commenters = HashMap::new();
        for comment in &comments {
            if !commenters.contains_key(&comment.user_id)
                && let Some(user) = state.user_repo.find_by_id(comment.user_id).await?
            {
                commenters.insert(user.id, user);
            }
        }
        Ok::<_, DomainError>((author, comments, favorites_count, favorited, commenters))
    }
    .await;

    let (author, comments, favorites_count, favorited, commenters) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => return error_response(e, "Book not found"),
    };

    let comments: Vec<CommentResponse> = comments
        .into_iter()
        .map(|c| CommentResponse {
            user: commenters
                .get(&c.user_id)
                .map(|u| UserResponse::new(u, &state.default_profile_image)),
            id: c.id,
            comment: c.comment,
            created_at: c.created_at,
        })
        .collect();

    let book = BookResponse {
        user: author
            .as_ref()
            .map(|u| UserResponse::new(u, &state.default_profile_image)),
        book,
    };

    (
        StatusCode::OK,
        Json(json!({
            "book": book,
            "book_comments": comments,
            "favorites_count": favorites_count,
            "favorited": favorited,
            "book_comment": { "comment": "" },
        })),
    )
        .into_response()
}

pub async fn edit(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let book = match find_book(&state, id).await {
        Ok(book) => book,
        Err(e) => return error_response(e, "Book not found"),
    };

    if book.user_id != current.id {
        return redirect_with_notice("/books", None);
    }

    (StatusCode::OK, Json(json!({ "book": book }))).into_response()
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i32>,
    Json(input): Json<BookInput>,
) -> impl IntoResponse {
    let book = match find_book(&state, id).await {
        Ok(book) => book,
        Err(e) => return error_response(e, "Book not found"),
    };

    if book.user_id != current.id {
        return redirect_with_notice("/books", None);
    }
    if let Err(errors) = validate(&input) {
        return invalid_form(&input, errors);
    }

    match state.book_repo.update(id, input).await {
        Ok(book) => redirect_with_notice(&format!("/books/{}", book.id), Some(UPDATE_NOTICE)),
        Err(e) => error_response(e, "Book not found"),
    }
}

pub async fn destroy(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let book = match find_book(&state, id).await {
        Ok(book) => book,
        Err(e) => return error_response(e, "Book not found"),
    };

    if book.user_id != current.id {
        return redirect_with_notice("/books", None);
    }

    match state.book_repo.delete(id).await {
        Ok(()) => {
            tracing::info!("User {} deleted book {}", current.id, id);
            redirect_with_notice("/books", None)
        }
        Err(e) => error_response(e, "Book not found"),
    }
}

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
};

use super::{error_response, redirect_back};
use crate::auth::CurrentUser;
use crate::domain::DomainError;
use crate::infrastructure::AppState;

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(book_id): Path<i32>,
    headers: HeaderMap,
) -> impl IntoResponse {
    match state.book_repo.find_by_id(book_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(DomainError::NotFound, "Book not found"),
        Err(e) => return error_response(e, "Book not found"),
    }

    match state.favorite_repo.favorite(current.id, book_id).await {
        Ok(_) => redirect_back(&headers, &format!("/books/{}", book_id)),
        Err(e) => error_response(e, "Book not found"),
    }
}

pub async fn destroy(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(book_id): Path<i32>,
    headers: HeaderMap,
) -> impl IntoResponse {
    match state.book_repo.find_by_id(book_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(DomainError::NotFound, "Book not found"),
        Err(e) => return error_response(e, "Book not found"),
    }

    match state.favorite_repo.unfavorite(current.id, book_id).await {
        Ok(_) => redirect_back(&headers, &format!("/books/{}", book_id)),
        Err(e) => error_response(e, "Book not found"),
    }
}

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use super::{error_response, redirect_with_notice};
use crate::auth::CurrentUser;
use crate::domain::DomainError;
use crate::domain::validation::{self, ValidationErrors};
use crate::infrastructure::AppState;

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub comment: String,
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(book_id): Path<i32>,
    Json(form): Json<CommentForm>,
) -> impl IntoResponse {
    match state.book_repo.find_by_id(book_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(DomainError::NotFound, "Book not found"),
        Err(e) => return error_response(e, "Book not found"),
    }

    let mut errors = ValidationErrors::default();
    validation::validate_comment(&mut errors, &form.comment);
    if let Err(errors) = errors.into_result() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "book_comment": { "comment": form.comment }, "errors": errors })),
        )
            .into_response();
    }

    match state
        .comment_repo
        .create(current.id, book_id, form.comment)
        .await
    {
        Ok(comment) => {
            tracing::info!("User {} commented on book {}", current.id, book_id);
            (
                StatusCode::SEE_OTHER,
                [(axum::http::header::LOCATION, format!("/books/{}", book_id))],
                Json(json!({ "location": format!("/books/{}", book_id), "book_comment": comment })),
            )
                .into_response()
        }
        Err(e) => error_response(e, "Book not found"),
    }
}

/// Only the comment's author can remove it
pub async fn destroy(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path((book_id, id)): Path<(i32, i32)>,
) -> impl IntoResponse {
    let comment = match state.comment_repo.find_by_id(id).await {
        Ok(Some(comment)) if comment.book_id == book_id => comment,
        Ok(_) => return error_response(DomainError::NotFound, "Comment not found"),
        Err(e) => return error_response(e, "Comment not found"),
    };

    let location = format!("/books/{}", book_id);
    if comment.user_id != current.id {
        return redirect_with_notice(&location, None);
    }

    match state.comment_repo.delete(id).await {
        Ok(()) => redirect_with_notice(&location, None),
        Err(e) => error_response(e, "Comment not found"),
    }
}

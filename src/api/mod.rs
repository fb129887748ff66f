pub mod auth;
pub mod book_comments;
pub mod books;
pub mod favorites;
pub mod health;
pub mod homes;
pub mod relationships;
pub mod users;

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::json;

use crate::domain::DomainError;
use crate::infrastructure::AppState;

pub fn app_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Homes
        .route("/", get(homes::top))
        .route("/home/about", get(homes::about))
        // Accounts
        .route(
            "/users",
            get(users::index)
                .post(auth::sign_up)
                .delete(auth::cancel_account),
        )
        .route("/users/sign_in", post(auth::sign_in))
        .route("/users/sign_out", delete(auth::sign_out))
        .route("/users/guest_sign_in", post(auth::guest_sign_in))
        // Users
        .route("/search", get(users::search))
        .route(
            "/users/:id",
            get(users::show).patch(users::update).put(users::update),
        )
        .route("/users/:id/edit", get(users::edit))
        .route("/users/:id/profile_image", get(users::profile_image))
        // Follow graph
        .route(
            "/users/:id/relationships",
            post(relationships::create).delete(relationships::destroy),
        )
        .route("/users/:id/followings", get(relationships::followings))
        .route("/users/:id/followers", get(relationships::followers))
        // Books
        .route("/books", get(books::index).post(books::create))
        .route(
            "/books/:id",
            get(books::show)
                .patch(books::update)
                .put(books::update)
                .delete(books::destroy),
        )
        .route("/books/:id/edit", get(books::edit))
        .route("/books/:book_id/book_comments", post(book_comments::create))
        .route(
            "/books/:book_id/book_comments/:id",
            delete(book_comments::destroy),
        )
        .route(
            "/books/:book_id/favorites",
            post(favorites::create).delete(favorites::destroy),
        )
        .with_state(state)
}

/// 303 to `location`, optionally carrying a flash-style notice in the body
pub fn redirect_with_notice(location: &str, notice: Option<&str>) -> Response {
    (
        StatusCode::SEE_OTHER,
        [(header::LOCATION, location.to_string())],
        Json(json!({ "location": location, "notice": notice })),
    )
        .into_response()
}

/// Redirect to the Referer when the client sent one, else to `fallback`
pub fn redirect_back(headers: &HeaderMap, fallback: &str) -> Response {
    let location = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback);
    redirect_with_notice(location, None)
}

/// Map a domain failure to a JSON error response
pub fn error_response(e: DomainError, not_found: &str) -> Response {
    match e {
        DomainError::NotFound => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": not_found }))).into_response()
        }
        DomainError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": errors })),
        )
            .into_response(),
        e => {
            tracing::error!("Request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

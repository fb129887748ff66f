//! Follow / unfollow and the followings/followers listings

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde_json::json;

use super::users::UserResponse;
use super::{error_response, redirect_back};
use crate::auth::CurrentUser;
use crate::domain::{DomainError, User};
use crate::infrastructure::AppState;

async fn find_user(state: &AppState, id: i32) -> Result<User, DomainError> {
    state
        .user_repo
        .find_by_id(id)
        .await?
        .ok_or(DomainError::NotFound)
}

#[utoipa::path(
    post,
    path = "/users/{id}/relationships",
    params(("id" = i32, Path, description = "User to follow")),
    responses(
        (status = 303, description = "Followed, redirected back"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Tried to follow yourself")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(e) = find_user(&state, id).await {
        return error_response(e, "User not found");
    }

    match state.relationship_repo.follow(current.id, id).await {
        Ok(created) => {
            if created {
                tracing::info!("User {} followed user {}", current.id, id);
            }
            redirect_back(&headers, &format!("/users/{}", id))
        }
        Err(e) => error_response(e, "User not found"),
    }
}

#[utoipa::path(
    delete,
    path = "/users/{id}/relationships",
    params(("id" = i32, Path, description = "User to unfollow")),
    responses(
        (status = 303, description = "Unfollowed (or was not following), redirected back"),
        (status = 404, description = "User not found")
    )
)]
pub async fn destroy(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(e) = find_user(&state, id).await {
        return error_response(e, "User not found");
    }

    match state.relationship_repo.unfollow(current.id, id).await {
        Ok(removed) => {
            if removed {
                tracing::info!("User {} unfollowed user {}", current.id, id);
            }
            redirect_back(&headers, &format!("/users/{}", id))
        }
        Err(e) => error_response(e, "User not found"),
    }
}

pub async fn followings(
    State(state): State<AppState>,
    CurrentUser(_current): CurrentUser,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let user = match find_user(&state, id).await {
        Ok(user) => user,
        Err(e) => return error_response(e, "User not found"),
    };

    match state.relationship_repo.followings(id).await {
        Ok(users) => (
            StatusCode::OK,
            Json(json!({
                "user": UserResponse::new(&user, &state.default_profile_image),
                "users": UserResponse::list(&users, &state.default_profile_image),
            })),
        )
            .into_response(),
        Err(e) => error_response(e, "User not found"),
    }
}

pub async fn followers(
    State(state): State<AppState>,
    CurrentUser(_current): CurrentUser,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let user = match find_user(&state, id).await {
        Ok(user) => user,
        Err(e) => return error_response(e, "User not found"),
    };

    match state.relationship_repo.followers(id).await {
        Ok(users) => (
            StatusCode::OK,
            Json(json!({
                "user": UserResponse::new(&user, &state.default_profile_image),
                "users": UserResponse::list(&users, &state.default_profile_image),
            })),
        )
            .into_response(),
        Err(e) => error_response(e, "User not found"),
    }
}

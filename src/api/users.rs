//! User handlers: listing, search, profile pages and profile updates

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

use super::{error_response, redirect_with_notice};
use crate::auth::CurrentUser;
use crate::domain::{
    BookInput, BookQuery, DomainError, SearchMethod, SearchRange, User, UserQuery,
};
use crate::infrastructure::AppState;
use crate::services::{ImageSize, ProfileForm, ProfileImage, image_service, profile_service};

pub const UPDATE_NOTICE: &str = "You have updated user successfully.";

/// Public view of a user
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub introduction: Option<String>,
    pub profile_image_url: String,
    pub created_at: String,
}

impl UserResponse {
    pub fn new(user: &User, default_image: &str) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            introduction: user.introduction.clone(),
            profile_image_url: ProfileImage::for_user(user, default_image, ImageSize::default())
                .url(),
            created_at: user.created_at.clone(),
        }
    }

    pub fn list(users: &[User], default_image: &str) -> Vec<Self> {
        users.iter().map(|u| Self::new(u, default_image)).collect()
    }
}

/// The users index body: list, signed-in user, empty new-book form
fn index_body(state: &AppState, users: &[User], current: &User) -> serde_json::Value {
    json!({
        "users": UserResponse::list(users, &state.default_profile_image),
        "user": UserResponse::new(current, &state.default_profile_image),
        "book": BookInput::default(),
    })
}

#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All users"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn index(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
) -> impl IntoResponse {
    match state.user_repo.find_all().await {
        Ok(users) => (StatusCode::OK, Json(index_body(&state, &users, &current))).into_response(),
        Err(e) => error_response(e, "User not found"),
    }
}

/// GET /search
///
/// Accepts the search form (`word`, `search`, `range`) and ransack-style
/// `q[...]` filters. Always answers in the index shape.
#[utoipa::path(
    get,
    path = "/search",
    params(
        ("word" = Option<String>, Query, description = "Text to look for"),
        ("search" = Option<String>, Query, description = "perfect | forward | backward | partial"),
        ("range" = Option<String>, Query, description = "User (default) or Book")
    ),
    responses(
        (status = 200, description = "Matching users or books"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn search(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let method = params
        .get("search")
        .map(|m| SearchMethod::from_param(m))
        .unwrap_or_default();
    let range = params
        .get("range")
        .map(|r| SearchRange::from_param(r))
        .unwrap_or_default();
    let word = params.get("word").cloned();

    if range == SearchRange::Book {
        let query = BookQuery {
            title: word.clone().unwrap_or_default(),
            method,
        };
        return match state.book_repo.search(query).await {
            Ok(books) => (
                StatusCode::OK,
                Json(json!({
                    "range": "Book",
                    "word": word,
                    "books": books,
                    "user": UserResponse::new(&current, &state.default_profile_image),
                    "book": BookInput::default(),
                })),
            )
                .into_response(),
            Err(e) => error_response(e, "Book not found"),
        };
    }

    let mut query = UserQuery::from_params(&params);
    if let Some(word) = &word {
        query = UserQuery::name_search(word, method).and(query);
    }
    tracing::debug!("User search: {:?}", query);

    match state.user_repo.search(query).await {
        Ok(users) => {
            let mut body = index_body(&state, &users, &current);
            body["range"] = json!("User");
            body["word"] = json!(word);
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => error_response(e, "User not found"),
    }
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "Profile with books and follow counts"),
        (status = 404, description = "User not found")
    )
)]
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let user = match state.user_repo.find_by_id(id).await {
        Ok(Some(user)) => user,
        Ok(None) => return error_response(DomainError::NotFound, "User not found"),
        Err(e) => return error_response(e, "User not found"),
    };

    let books = state.book_repo.find_by_user(id).await;
    let counts = state.relationship_repo.counts(id).await;
    let following = state.relationship_repo.is_following(current.id, id).await;

    match (books, counts, following) {
        (Ok(books), Ok(counts), Ok(following)) => (
            StatusCode::OK,
            Json(json!({
                "user": UserResponse::new(&user, &state.default_profile_image),
                "books": books,
                "follow_counts": counts,
                "is_following": following,
                "is_self": current.id == id,
                "book": BookInput::default(),
            })),
        )
            .into_response(),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => error_response(e, "User not found"),
    }
}

/// Only the owner gets the form; everyone else is sent to their own page.
#[utoipa::path(
    get,
    path = "/users/{id}/edit",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "Edit form for the signed-in user"),
        (status = 303, description = "Not the owner, redirected to own profile"),
        (status = 404, description = "User not found")
    )
)]
pub async fn edit(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let user = match state.user_repo.find_by_id(id).await {
        Ok(Some(user)) => user,
        Ok(None) => return error_response(DomainError::NotFound, "User not found"),
        Err(e) => return error_response(e, "User not found"),
    };

    if user.id != current.id {
        return redirect_with_notice(&format!("/users/{}", current.id), None);
    }

    (
        StatusCode::OK,
        Json(json!({ "user": UserResponse::new(&user, &state.default_profile_image) })),
    )
        .into_response()
}

/// Reads the allow-listed fields. Rails-style `user[name]` keys are accepted
/// as well as bare `name`.
async fn read_profile_form(mut multipart: Multipart) -> Result<ProfileForm, String> {
    let mut form = ProfileForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        let Some(raw_name) = field.name().map(str::to_string) else {
            continue;
        };
        let name = raw_name
            .strip_prefix("user[")
            .and_then(|n| n.strip_suffix(']'))
            .unwrap_or(&raw_name);

        match name {
            "name" => form.name = Some(field.text().await.map_err(|e| e.to_string())?),
            "introduction" => {
                form.introduction = Some(field.text().await.map_err(|e| e.to_string())?)
            }
            "profile_image" => {
                form.profile_image = Some(field.bytes().await.map_err(|e| e.to_string())?.to_vec())
            }
            other => tracing::debug!("Ignoring unpermitted parameter: {}", other),
        }
    }

    Ok(form)
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> impl IntoResponse {
    match state.user_repo.find_by_id(id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(DomainError::NotFound, "User not found"),
        Err(e) => return error_response(e, "User not found"),
    }

    if id != current.id {
        return redirect_with_notice(&format!("/users/{}", current.id), None);
    }

    let form = match read_profile_form(multipart).await {
        Ok(form) => form,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("Invalid form data: {}", e) })),
            )
                .into_response();
        }
    };
    let submitted = json!({
        "id": id,
        "name": form.name,
        "introduction": form.introduction,
    });

    match profile_service::update_profile(state.user_repo.as_ref(), &state.storage, id, form).await
    {
        Ok(user) => redirect_with_notice(&format!("/users/{}", user.id), Some(UPDATE_NOTICE)),
        Err(DomainError::Validation(errors)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "user": submitted, "errors": errors })),
        )
            .into_response(),
        Err(e) => error_response(e, "User not found"),
    }
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Serves a resized variant, or redirects to the default image
pub async fn profile_image(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(params): Query<ImageQuery>,
) -> impl IntoResponse {
    let user = match state.user_repo.find_by_id(id).await {
        Ok(Some(user)) => user,
        Ok(None) => return error_response(DomainError::NotFound, "User not found"),
        Err(e) => return error_response(e, "User not found"),
    };

    let size = ImageSize::from_query(params.width, params.height);
    let key = match ProfileImage::for_user(&user, &state.default_profile_image, size) {
        ProfileImage::Attached { key, .. } => key,
        ProfileImage::Default(path) => return found(&path),
    };

    match image_service::variant(&state.storage, &key, size).await {
        Ok((bytes, content_type)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type),
                (header::CACHE_CONTROL, "public, max-age=3600"),
            ],
            bytes,
        )
            .into_response(),
        Err(DomainError::NotFound) => {
            tracing::warn!("Profile image {} for user {} is missing", key, id);
            found(&state.default_profile_image)
        }
        Err(e) => error_response(e, "Image not found"),
    }
}

//! Account handlers: sign up, sign in/out, guest access and cancellation

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::users::UserResponse;
use super::{error_response, redirect_with_notice};
use crate::auth::{CurrentUser, create_jwt};
use crate::domain::{DomainError, User};
use crate::infrastructure::AppState;
use crate::services::account_service::{self, Registration};

pub const SIGN_IN_ERROR: &str = "Invalid email or password.";
pub const GUEST_NOTICE: &str = "Signed in as guest user.";
pub const GUEST_CANCEL_NOTICE: &str = "The guest user cannot be deleted.";

#[derive(Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    token: String,
    user: UserResponse,
    notice: Option<&'static str>,
}

fn session(
    state: &AppState,
    user: &User,
    status: StatusCode,
    notice: Option<&'static str>,
) -> axum::response::Response {
    match create_jwt(user.id, &user.role) {
        Ok(token) => (
            status,
            Json(SessionResponse {
                token,
                user: UserResponse::new(user, &state.default_profile_image),
                notice,
            }),
        )
            .into_response(),
        Err(e) => error_response(DomainError::Internal(e), "User not found"),
    }
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(form): Json<Registration>,
) -> impl IntoResponse {
    let submitted = json!({ "name": form.name, "email": form.email });

    match account_service::register(state.user_repo.as_ref(), form).await {
        Ok(user) => session(&state, &user, StatusCode::CREATED, None),
        Err(DomainError::Validation(errors)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "user": submitted, "errors": errors })),
        )
            .into_response(),
        Err(e) => error_response(e, "User not found"),
    }
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> impl IntoResponse {
    tracing::info!("Sign in attempt for {}", payload.email);

    match account_service::authenticate(state.user_repo.as_ref(), &payload.email, &payload.password)
        .await
    {
        Ok(Some(user)) => session(&state, &user, StatusCode::OK, None),
        Ok(None) => {
            tracing::warn!("Sign in failed for {}", payload.email);
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": SIGN_IN_ERROR })),
            )
                .into_response()
        }
        Err(e) => error_response(e, "User not found"),
    }
}

/// Tokens are stateless; the client forgets its token
pub async fn sign_out(CurrentUser(current): CurrentUser) -> impl IntoResponse {
    tracing::info!("User {} signed out", current.id);
    redirect_with_notice("/", None)
}

pub async fn guest_sign_in(State(state): State<AppState>) -> impl IntoResponse {
    match account_service::guest_user(state.user_repo.as_ref()).await {
        Ok(user) => session(&state, &user, StatusCode::OK, Some(GUEST_NOTICE)),
        Err(e) => error_response(e, "User not found"),
    }
}

pub async fn cancel_account(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
) -> impl IntoResponse {
    if current.is_guest() {
        return redirect_with_notice("/", Some(GUEST_CANCEL_NOTICE));
    }

    match account_service::cancel_account(state.user_repo.as_ref(), &state.storage, &current).await
    {
        Ok(()) => redirect_with_notice("/", None),
        Err(e) => error_response(e, "User not found"),
    }
}

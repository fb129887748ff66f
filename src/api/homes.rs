use axum::Json;
use serde_json::{Value, json};

pub async fn top() -> Json<Value> {
    Json(json!({
        "message": "Welcome to Bookers",
        "sign_up": "/users",
        "sign_in": "/users/sign_in",
        "guest_sign_in": "/users/guest_sign_in",
    }))
}

pub async fn about() -> Json<Value> {
    Json(json!({
        "about": "Bookers is a place to share the books you read and follow other readers.",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

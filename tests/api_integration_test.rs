use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use bookers::api;
use bookers::auth::create_jwt;
use bookers::config::Config;
use bookers::db;
use bookers::infrastructure::AppState;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde_json::Value;
use std::path::PathBuf;
use tower::util::ServiceExt; // for `oneshot`

struct TestApp {
    db: DatabaseConnection,
    router: Router,
    storage_dir: PathBuf,
}

// Helper to create the app over an in-memory database
async fn setup_app() -> TestApp {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let storage_dir =
        std::env::temp_dir().join(format!("bookers-test-{}", uuid::Uuid::new_v4()));
    let config = Config {
        storage_dir: storage_dir.clone(),
        ..Config::default()
    };
    let router = api::app_router(AppState::new(db.clone(), &config));
    TestApp {
        db,
        router,
        storage_dir,
    }
}

// Helper to create a user directly in the database
async fn create_user(db: &DatabaseConnection, name: &str) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let user = bookers::models::user::ActiveModel {
        name: Set(name.to_string()),
        email: Set(format!("{}@example.com", name.to_lowercase())),
        password_hash: Set("hash".to_string()),
        role: Set("user".to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    user.insert(db).await.expect("Failed to create user").id
}

fn token_for(user_id: i32) -> String {
    format!("Bearer {}", create_jwt(user_id, "user").unwrap())
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, header::HeaderMap, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, headers, json)
}

fn get(uri: &str, user_id: i32) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, token_for(user_id))
        .body(Body::empty())
        .unwrap()
}

const BOUNDARY: &str = "XBOOKERSBOUNDARY";

fn multipart_body(fields: &[(&str, &str)], image: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = image {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"user[profile_image]\"; filename=\"me.png\"\r\nContent-Type: image/png\r\n\r\n",
                BOUNDARY
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn update_request(id: i32, as_user: i32, fields: &[(&str, &str)], image: Option<&[u8]>) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(format!("/users/{}", id))
        .header(header::AUTHORIZATION, token_for(as_user))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(fields, image)))
        .unwrap()
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 120, 200]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

#[tokio::test]
async fn test_index_lists_users_with_empty_book_form() {
    let app = setup_app().await;
    let alice = create_user(&app.db, "alice").await;
    create_user(&app.db, "bob").await;

    let (status, _, body) = send(&app.router, get("/users", alice)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 2);
    assert_eq!(body["user"]["name"], "alice");
    assert_eq!(body["book"]["title"], "");
    assert_eq!(
        body["users"][0]["profile_image_url"],
        "/assets/no_image.png"
    );
}

#[tokio::test]
async fn test_show_includes_books_and_follow_state() {
    let app = setup_app().await;
    let alice = create_user(&app.db, "alice").await;
    let bob = create_user(&app.db, "bob").await;

    let now = chrono::Utc::now().to_rfc3339();
    bookers::models::book::ActiveModel {
        user_id: Set(bob),
        title: Set("Dune".to_string()),
        body: Set("Spice".to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&app.db)
    .await
    .unwrap();

    let follow = Request::builder()
        .method("POST")
        .uri(format!("/users/{}/relationships", bob))
        .header(header::AUTHORIZATION, token_for(alice))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app.router, follow).await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let (status, _, body) = send(&app.router, get(&format!("/users/{}", bob), alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "bob");
    assert_eq!(body["books"][0]["title"], "Dune");
    assert_eq!(body["is_following"], true);
    assert_eq!(body["is_self"], false);
    assert_eq!(body["follow_counts"]["followers"], 1);
    assert_eq!(body["follow_counts"]["followings"], 0);
}

#[tokio::test]
async fn test_edit_other_user_redirects_to_own_page() {
    let app = setup_app().await;
    let alice = create_user(&app.db, "alice").await;
    let bob = create_user(&app.db, "bob").await;

    let (status, headers, _) =
        send(&app.router, get(&format!("/users/{}/edit", bob), alice)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(
        headers.get(header::LOCATION).unwrap(),
        &format!("/users/{}", alice)
    );

    let (status, _, body) = send(&app.router, get(&format!("/users/{}/edit", alice), alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], alice);
}

#[tokio::test]
async fn test_update_profile_redirects_with_notice() {
    let app = setup_app().await;
    let alice = create_user(&app.db, "alice").await;

    let request = update_request(
        alice,
        alice,
        &[("user[name]", "alicia"), ("user[introduction]", "Hello")],
        None,
    );
    let (status, headers, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(
        headers.get(header::LOCATION).unwrap(),
        &format!("/users/{}", alice)
    );
    assert_eq!(body["notice"], "You have updated user successfully.");

    let stored = bookers::models::user::Entity::find_by_id(alice)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "alicia");
    assert_eq!(stored.introduction.as_deref(), Some("Hello"));
}

#[tokio::test]
async fn test_update_with_taken_name_is_unprocessable() {
    let app = setup_app().await;
    let alice = create_user(&app.db, "alice").await;
    create_user(&app.db, "bob").await;

    let request = update_request(alice, alice, &[("user[name]", "bob")], None);
    let (status, _, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["name"][0], "has already been taken");
    assert_eq!(body["user"]["name"], "bob");

    let stored = bookers::models::user::Entity::find_by_id(alice)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "alice");
}

#[tokio::test]
async fn test_update_with_invalid_lengths_is_unprocessable() {
    let app = setup_app().await;
    let alice = create_user(&app.db, "alice").await;
    let long_intro = "x".repeat(51);

    let request = update_request(
        alice,
        alice,
        &[("name", "a"), ("introduction", long_intro.as_str())],
        None,
    );
    let (status, _, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["name"].is_array());
    assert!(body["errors"]["introduction"].is_array());
}

#[tokio::test]
async fn test_update_reports_every_invalid_field() {
    let app = setup_app().await;
    let alice = create_user(&app.db, "alice").await;

    let request = update_request(
        alice,
        alice,
        &[("user[name]", "a")],
        Some(b"GIF89a not an accepted image".as_slice()),
    );
    let (status, _, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["name"].is_array());
    assert_eq!(
        body["errors"]["profile_image"][0],
        "must be a JPEG or PNG image"
    );
}

#[tokio::test]
async fn test_update_cannot_take_guest_name() {
    let app = setup_app().await;
    let alice = create_user(&app.db, "alice").await;

    let request = update_request(alice, alice, &[("user[name]", "guestuser")], None);
    let (status, _, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["name"][0], "has already been taken");
}

#[tokio::test]
async fn test_update_other_user_is_redirected() {
    let app = setup_app().await;
    let alice = create_user(&app.db, "alice").await;
    let bob = create_user(&app.db, "bob").await;

    let request = update_request(bob, alice, &[("user[name]", "hacked")], None);
    let (status, headers, _) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(
        headers.get(header::LOCATION).unwrap(),
        &format!("/users/{}", alice)
    );
    let stored = bookers::models::user::Entity::find_by_id(bob)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "bob");
}

#[tokio::test]
async fn test_profile_image_upload_and_variant() {
    let app = setup_app().await;
    let alice = create_user(&app.db, "alice").await;

    let image = png(300, 150);
    let request = update_request(alice, alice, &[("user[name]", "alice")], Some(&image));
    let (status, _, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let (_, _, body) = send(&app.router, get(&format!("/users/{}", alice), alice)).await;
    assert_eq!(
        body["user"]["profile_image_url"],
        format!("/users/{}/profile_image?width=100&height=100", alice)
    );

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/users/{}/profile_image?width=60&height=60", alice))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let resized = image::load_from_memory(&bytes).unwrap();
    assert_eq!((resized.width(), resized.height()), (60, 30));

    let _ = tokio::fs::remove_dir_all(&app.storage_dir).await;
}

#[tokio::test]
async fn test_profile_image_without_attachment_redirects_to_default() {
    let app = setup_app().await;
    let alice = create_user(&app.db, "alice").await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/users/{}/profile_image", alice))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/assets/no_image.png"
    );
}

#[tokio::test]
async fn test_search_modes_over_names() {
    let app = setup_app().await;
    let alice = create_user(&app.db, "alice").await;
    create_user(&app.db, "alicia").await;
    create_user(&app.db, "malice").await;

    let names = |body: &Value| -> Vec<String> {
        body["users"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["name"].as_str().unwrap().to_string())
            .collect()
    };

    let (_, _, body) = send(&app.router, get("/search?word=alice&search=perfect", alice)).await;
    assert_eq!(names(&body), vec!["alice"]);

    let (_, _, body) = send(&app.router, get("/search?word=ali&search=forward", alice)).await;
    assert_eq!(names(&body), vec!["alice", "alicia"]);

    let (_, _, body) = send(&app.router, get("/search?word=ice&search=backward", alice)).await;
    assert_eq!(names(&body), vec!["alice", "malice"]);

    let (_, _, body) = send(&app.router, get("/search?word=lic&search=partial", alice)).await;
    assert_eq!(names(&body), vec!["alice", "alicia", "malice"]);

    let (status, _, body) = send(&app.router, get("/search?word=lic&search=bogus", alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body).len(), 3);
    assert_eq!(body["range"], "User");
}

#[tokio::test]
async fn test_search_with_ransack_params() {
    let app = setup_app().await;
    let alice = create_user(&app.db, "alice").await;
    create_user(&app.db, "bob").await;

    let (status, _, body) = send(
        &app.router,
        get("/search?q%5Bname_start%5D=bo&q%5Bs%5D=name+desc", alice),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["name"], "bob");
}

#[tokio::test]
async fn test_search_books_range() {
    let app = setup_app().await;
    let alice = create_user(&app.db, "alice").await;
    let now = chrono::Utc::now().to_rfc3339();
    for title in ["Dune", "Dune Messiah", "Emma"] {
        bookers::models::book::ActiveModel {
            user_id: Set(alice),
            title: Set(title.to_string()),
            body: Set("notes".to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        }
        .insert(&app.db)
        .await
        .unwrap();
    }

    let (status, _, body) =
        send(&app.router, get("/search?word=Dune&search=forward&range=Book", alice)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["range"], "Book");
    assert_eq!(body["books"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_follow_flow_and_listings() {
    let app = setup_app().await;
    let alice = create_user(&app.db, "alice").await;
    let bob = create_user(&app.db, "bob").await;

    let follow = |referer: Option<&str>| {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/users/{}/relationships", bob))
            .header(header::AUTHORIZATION, token_for(alice));
        if let Some(referer) = referer {
            builder = builder.header(header::REFERER, referer);
        }
        builder.body(Body::empty()).unwrap()
    };

    // Redirects back to the referring page
    let (status, headers, _) = send(&app.router, follow(Some("/users"))).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers.get(header::LOCATION).unwrap(), "/users");

    // Following twice keeps a single edge
    let (status, headers, _) = send(&app.router, follow(None)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(
        headers.get(header::LOCATION).unwrap(),
        &format!("/users/{}", bob)
    );

    let (_, _, body) =
        send(&app.router, get(&format!("/users/{}/followings", alice), alice)).await;
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
    assert_eq!(body["users"][0]["name"], "bob");

    let (_, _, body) = send(&app.router, get(&format!("/users/{}/followers", bob), alice)).await;
    assert_eq!(body["user"]["name"], "bob");
    assert_eq!(body["users"][0]["name"], "alice");

    let unfollow = Request::builder()
        .method("DELETE")
        .uri(format!("/users/{}/relationships", bob))
        .header(header::AUTHORIZATION, token_for(alice))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app.router, unfollow).await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let (_, _, body) = send(&app.router, get(&format!("/users/{}/followers", bob), alice)).await;
    assert!(body["users"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_book_lifecycle() {
    let app = setup_app().await;
    let alice = create_user(&app.db, "alice").await;
    let bob = create_user(&app.db, "bob").await;

    let json_request = |method: &str, uri: String, user: i32, body: Value| {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, token_for(user))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    let (status, headers, body) = send(
        &app.router,
        json_request(
            "POST",
            "/books".to_string(),
            alice,
            serde_json::json!({ "title": "Dune", "body": "Spice" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(body["notice"], "You have created book successfully.");
    let location = headers
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let book_id: i32 = location.trim_start_matches("/books/").parse().unwrap();

    // Another user cannot change it
    let (status, headers, _) = send(
        &app.router,
        json_request(
            "PATCH",
            format!("/books/{}", book_id),
            bob,
            serde_json::json!({ "title": "Mine", "body": "now" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers.get(header::LOCATION).unwrap(), "/books");

    // Comment and favorite as bob
    let (status, _, _) = send(
        &app.router,
        json_request(
            "POST",
            format!("/books/{}/book_comments", book_id),
            bob,
            serde_json::json!({ "comment": "Great read" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let favorite = Request::builder()
        .method("POST")
        .uri(format!("/books/{}/favorites", book_id))
        .header(header::AUTHORIZATION, token_for(bob))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app.router, favorite).await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let (status, _, body) = send(&app.router, get(&format!("/books/{}", book_id), bob)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["title"], "Dune");
    assert_eq!(body["book"]["user"]["name"], "alice");
    assert_eq!(body["book_comments"][0]["comment"], "Great read");
    assert_eq!(body["book_comments"][0]["user"]["name"], "bob");
    assert_eq!(body["favorites_count"], 1);
    assert_eq!(body["favorited"], true);

    // Owner updates, then deletes
    let (status, _, body) = send(
        &app.router,
        json_request(
            "PATCH",
            format!("/books/{}", book_id),
            alice,
            serde_json::json!({ "title": "Dune", "body": "Spice must flow" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(body["notice"], "You have updated book successfully.");

    let destroy = Request::builder()
        .method("DELETE")
        .uri(format!("/books/{}", book_id))
        .header(header::AUTHORIZATION, token_for(alice))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app.router, destroy).await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let (status, _, _) = send(&app.router, get(&format!("/books/{}", book_id), alice)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_home_pages_are_public() {
    let app = setup_app().await;

    for uri in ["/", "/home/about"] {
        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

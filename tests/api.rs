//! HTTP integration tests.
//!
//! Each test drives the full router against an in-memory database, a
//! temporary gallery directory and a temporary mail outbox.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use bistro_admin::config::AppConfig;
use bistro_admin::notify::OutboxTransport;
use bistro_admin::repository::init_db;
use bistro_admin::{build_router, AppState};

const ADMIN: &str = "admin-secret";
const STAFF: &str = "staff-secret";

struct Fixture {
    app: Router,
    gallery: TempDir,
    outbox: TempDir,
}

async fn setup() -> Fixture {
    let gallery = tempfile::tempdir().unwrap();
    let outbox = tempfile::tempdir().unwrap();

    let env: HashMap<String, String> = [
        ("BISTRO_ADMIN_TOKEN", ADMIN),
        ("BISTRO_STAFF_TOKEN", STAFF),
        ("BISTRO_GALLERY_DIR", gallery.path().to_str().unwrap()),
        ("BISTRO_RESTAURANT_NAME", "Bistro Test"),
        ("BISTRO_RESTAURANT_ADDRESS", "Marktplatz 1, Stuttgart"),
        ("BISTRO_RESTAURANT_EMAIL", "desk@bistro.test"),
        ("BISTRO_PUBLIC_BASE_URL", "https://bistro.test"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let config = AppConfig::from_lookup(|key| env.get(key).cloned()).unwrap();

    let db = init_db(Path::new(":memory:")).await.expect("Failed to init test DB");
    let transport = Arc::new(OutboxTransport::new(outbox.path()));
    let state = AppState::new(db, &config, transport).unwrap();

    Fixture {
        app: build_router(state),
        gallery,
        outbox,
    }
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

fn outbox_mails(dir: &TempDir) -> Vec<String> {
    let mut files: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    files.sort();
    files.iter().map(|p| std::fs::read_to_string(p).unwrap()).collect()
}

fn booking() -> Value {
    json!({
        "name": "Anna Beck",
        "email": "anna@example.com",
        "phone": "+49 711 123456",
        "guests": 4,
        "date": "2030-06-14",
        "time": "19:30",
        "comment": "Window table please"
    })
}

#[tokio::test]
async fn test_menu_save_and_read() {
    let fx = setup().await;

    let (status, body) = send(
        &fx.app,
        request(
            Method::POST,
            "/api/menu",
            Some(ADMIN),
            Some(json!([
                {"name": "Cocktails", "items": [{"name": "Mojito", "price": 8.5}]}
            ])),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let response = fx
        .app
        .clone()
        .oneshot(request(Method::GET, "/api/menu", None, None))
        .await
        .unwrap();
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-cache, must-revalidate"
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let menu: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(menu[0]["name"], "Cocktails");
    assert_eq!(menu[0]["items"][0]["name"], "Mojito");
    assert!(menu[0]["items"][0]["id"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_menu_rejects_non_array() {
    let fx = setup().await;

    let (status, body) = send(
        &fx.app,
        request(Method::POST, "/api/menu", Some(ADMIN), Some(json!({"name": "Cocktails"}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("array"));
}

#[tokio::test]
async fn test_menu_invalid_price_changes_nothing() {
    let fx = setup().await;
    send(
        &fx.app,
        request(Method::POST, "/api/menu", Some(ADMIN), Some(json!([{"name": "Pizza"}]))),
    )
    .await;

    let (status, body) = send(
        &fx.app,
        request(
            Method::POST,
            "/api/menu",
            Some(ADMIN),
            Some(json!([{"name": "Drinks", "items": [{"name": "Cola", "price": "cheap"}]}])),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, menu) = send(&fx.app, request(Method::GET, "/api/menu", None, None)).await;
    assert_eq!(menu.as_array().unwrap().len(), 1);
    assert_eq!(menu[0]["name"], "Pizza");
}

#[tokio::test]
async fn test_auth_gate() {
    let fx = setup().await;
    let menu = json!([]);

    let (status, body) = send(&fx.app, request(Method::POST, "/api/menu", None, Some(menu.clone()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&fx.app, request(Method::POST, "/api/menu", Some("guess"), Some(menu.clone()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&fx.app, request(Method::POST, "/api/menu", Some(STAFF), Some(menu))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&fx.app, request(Method::GET, "/api/reservations", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&fx.app, request(Method::GET, "/api/reservations", Some(STAFF), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_save_category_returns_id() {
    let fx = setup().await;

    let (status, body) = send(
        &fx.app,
        request(
            Method::POST,
            "/api/menu/category",
            Some(ADMIN),
            Some(json!({"id": "cat-1", "name": "Desserts", "items": [{"name": "Tiramisu", "price": 6}]})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let id = body["id"].as_i64().unwrap();

    let (_, menu) = send(&fx.app, request(Method::GET, "/api/menu", None, None)).await;
    assert_eq!(menu[0]["id"], id);
    assert_eq!(menu[0]["items"][0]["name"], "Tiramisu");
}

#[tokio::test]
async fn test_save_category_rejects_foreign_temp_id() {
    let fx = setup().await;

    let (status, body) = send(
        &fx.app,
        request(
            Method::POST,
            "/api/menu/category",
            Some(ADMIN),
            Some(json!({"id": "item-1", "name": "Desserts"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, menu) = send(&fx.app, request(Method::GET, "/api/menu", None, None)).await;
    assert_eq!(menu, json!([]));
}

#[tokio::test]
async fn test_reservation_flow_sends_mails() {
    let fx = setup().await;

    let (status, body) = send(&fx.app, request(Method::POST, "/api/reservations", None, Some(booking()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["mailed"], true);
    let id = body["id"].as_str().unwrap().to_string();
    assert!(id.starts_with('C'));

    let mails = outbox_mails(&fx.outbox);
    assert_eq!(mails.len(), 1);
    assert!(mails[0].contains("<!-- To: desk@bistro.test -->"));
    assert!(mails[0].contains("Anna Beck"));

    let (_, list) = send(&fx.app, request(Method::GET, "/api/reservations", Some(STAFF), None)).await;
    let mut reservations = list.as_array().unwrap().clone();
    assert_eq!(reservations.len(), 1);
    assert_eq!(reservations[0]["status"], "pending");
    reservations[0]["status"] = json!("confirmed");

    let (status, body) = send(
        &fx.app,
        request(Method::PUT, "/api/reservations", Some(STAFF), Some(Value::Array(reservations))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "mailed": 1}));

    let mails = outbox_mails(&fx.outbox);
    assert_eq!(mails.len(), 2);
    let confirmation = mails
        .iter()
        .find(|m| m.contains("<!-- To: anna@example.com -->"))
        .expect("confirmation mail");
    assert!(confirmation.contains("https://calendar.google.com/calendar/render?action=TEMPLATE"));
    assert!(confirmation.contains("https://bistro.test/api/ics?date=2030-06-14"));

    let (_, list) = send(&fx.app, request(Method::GET, "/api/reservations", Some(ADMIN), None)).await;
    assert_eq!(list[0]["id"], id);
    assert_eq!(list[0]["status"], "confirmed");
}

#[tokio::test]
async fn test_reservation_desk_deletes_omitted() {
    let fx = setup().await;
    send(&fx.app, request(Method::POST, "/api/reservations", None, Some(booking()))).await;

    let (status, body) = send(&fx.app, request(Method::PUT, "/api/reservations", Some(STAFF), Some(json!([])))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mailed"], 0);

    let (_, list) = send(&fx.app, request(Method::GET, "/api/reservations", Some(STAFF), None)).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_reservation_rejects_bad_input() {
    let fx = setup().await;

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/reservations")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&fx.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid data"));

    let mut bad = booking();
    bad["email"] = json!("no-at-sign");
    let (status, body) = send(&fx.app, request(Method::POST, "/api/reservations", None, Some(bad))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(outbox_mails(&fx.outbox).is_empty());
}

#[tokio::test]
async fn test_ics_download() {
    let fx = setup().await;

    let response = fx
        .app
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/ics?date=2030-06-14&time=19%3A30&name=Anna%20Beck&guests=4",
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/calendar; charset=utf-8"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"reservation.ics\""
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let ics = String::from_utf8(body.to_vec()).unwrap();
    assert!(ics.starts_with("BEGIN:VCALENDAR"));
    // 19:30 CEST
    assert!(ics.contains("DTSTART:20300614T173000Z"));
    assert!(ics.contains("@bistro.test"));

    let (status, body) = send(&fx.app, request(Method::GET, "/api/ics?date=2030-06-14", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_website_content() {
    let fx = setup().await;

    let (status, body) = send(&fx.app, request(Method::GET, "/api/website", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["days"].as_array().unwrap().len(), 7);
    assert_eq!(body["images"], json!([]));

    let (status, _) = send(
        &fx.app,
        request(
            Method::POST,
            "/api/website",
            Some(ADMIN),
            Some(json!({"type": "contact_info", "contact": {"phone": " 0711 42 ", "instagram": "@bistro"}})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &fx.app,
        request(
            Method::POST,
            "/api/website",
            Some(ADMIN),
            Some(json!({"type": "opening_hours", "days": [{"name": "Monday", "hours": "Closed"}]})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&fx.app, request(Method::GET, "/api/website", None, None)).await;
    assert_eq!(body["contact"]["phone"], "0711 42");
    assert_eq!(body["contact"]["instagram"], "@bistro");
    assert_eq!(body["days"][0]["name"], "Monday");
    assert_eq!(body["days"][0]["hours"], "Closed");

    let (status, body) = send(
        &fx.app,
        request(Method::POST, "/api/website", Some(ADMIN), Some(json!({"type": "repaint"}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_gallery_upload_serve_and_delete() {
    let fx = setup().await;

    let (status, body) = send(
        &fx.app,
        request(
            Method::POST,
            "/api/gallery/upload",
            Some(ADMIN),
            Some(json!({
                "filename": "Terrace View.PNG",
                "data": "data:image/png;base64,aGVsbG8=",
                "alt": "Our terrace"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let src = body["image"]["src"].as_str().unwrap().to_string();
    assert!(src.starts_with("/images/gallery/bistro-terrace-view-"));
    assert!(src.ends_with(".png"));
    let id = body["image"]["id"].as_i64().unwrap();

    let response = fx
        .app
        .clone()
        .oneshot(request(Method::GET, &src, None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"hello");

    let (_, website) = send(&fx.app, request(Method::GET, "/api/website", None, None)).await;
    assert_eq!(website["images"][0]["alt"], "Our terrace");

    let (status, _) = send(
        &fx.app,
        request(Method::POST, "/api/website", Some(ADMIN), Some(json!({"type": "delete_image", "id": id}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(std::fs::read_dir(fx.gallery.path()).unwrap().count(), 0);

    let (status, _) = send(&fx.app, request(Method::GET, &src, None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let fx = setup().await;

    let (status, body) = send(&fx.app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "database": true}));
}

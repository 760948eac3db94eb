//! Bistro Admin Backend
//!
//! Layered architecture:
//! - domain: Core entities and business rules
//! - repository: Data access abstractions and implementations
//! - notify: Reservation mails and calendar invites
//! - commands: HTTP handlers

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod commands;
pub mod config;
pub mod domain;
pub mod notify;
pub mod repository;

use auth::AuthGate;
use config::AppConfig;
use domain::{DomainError, DomainResult};
use notify::{LogTransport, MailTransport, Notifier, OutboxTransport};
use repository::{init_db, DbState, GalleryRepository, MenuRepository, ReservationRepository, WebsiteRepository};

/// Gallery uploads arrive base64-encoded inside JSON
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub menu_repo: Arc<MenuRepository>,
    pub reservation_repo: Arc<ReservationRepository>,
    pub website_repo: Arc<WebsiteRepository>,
    pub gallery_repo: Arc<GalleryRepository>,
    pub notifier: Arc<Notifier>,
    pub auth: AuthGate,
}

impl FromRef<AppState> for AuthGate {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl AppState {
    pub fn new(db: DbState, config: &AppConfig, transport: Arc<dyn MailTransport>) -> DomainResult<Self> {
        Ok(Self {
            menu_repo: Arc::new(MenuRepository::new(db.conn.clone())),
            reservation_repo: Arc::new(ReservationRepository::new(db.conn.clone())),
            website_repo: Arc::new(WebsiteRepository::new(db.conn.clone())),
            gallery_repo: Arc::new(GalleryRepository::new(db.conn.clone(), config.gallery.clone())),
            notifier: Arc::new(Notifier::new(config.restaurant.clone(), transport)?),
            auth: AuthGate::new(&config.admin_token, config.staff_token.as_deref()),
            db,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let gallery_files = format!("{}{{file}}", state.gallery_repo.settings().url_prefix);

    Router::new()
        .route("/api/menu", get(commands::get_menu).post(commands::save_menu))
        .route("/api/menu/category", post(commands::save_category))
        .route(
            "/api/reservations",
            get(commands::list_reservations)
                .post(commands::submit_reservation)
                .put(commands::save_reservations),
        )
        .route("/api/ics", get(commands::download_ics))
        .route("/api/website", get(commands::get_website).post(commands::save_website))
        .route("/api/gallery/upload", post(commands::upload_gallery_image))
        .route(&gallery_files, get(commands::serve_gallery_file))
        .route("/health", get(commands::health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Start logging, open the database in the background and serve until the process ends
pub async fn run(config: AppConfig) -> DomainResult<()> {
    rolling_logger::init_logger(&config.log_dir, "bistro-admin").map_err(DomainError::Internal)?;

    let transport: Arc<dyn MailTransport> = match &config.mail_outbox_dir {
        Some(dir) => Arc::new(OutboxTransport::new(dir.clone())),
        None => {
            rolling_logger::warn("No mail outbox configured, mails are only logged");
            Arc::new(LogTransport)
        }
    };

    // Requests before the database is open answer "Database not initialized"
    let db = DbState::new();
    let state = AppState::new(db.clone(), &config, transport)?;

    let db_path = config.database_path.clone();
    tokio::spawn(async move {
        match init_db(&db_path).await {
            Ok(initialized) => {
                let mut conn_guard = db.conn.lock().await;
                *conn_guard = initialized.conn.lock().await.take();
                rolling_logger::info("Async DB init success");
            }
            Err(e) => rolling_logger::error(&format!("Async DB init failed: {}", e)),
        }
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "Listening");
    axum::serve(listener, build_router(state))
        .await
        .map_err(|e| DomainError::Internal(format!("Server stopped: {}", e)))
}

//! Website Repository - Core
//!
//! Opening hours and contact settings share this repository; the gallery has
//! its own in `gallery`.

use rusqlite::Connection;
use std::sync::Arc;
use tokio::sync::Mutex;

/// SQLite implementation of the website content repository
pub struct WebsiteRepository {
    pub(super) conn: Arc<Mutex<Option<Connection>>>,
}

impl WebsiteRepository {
    pub fn new(conn: Arc<Mutex<Option<Connection>>>) -> Self {
        Self { conn }
    }
}

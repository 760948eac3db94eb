//! Contact Settings Operations
//!
//! The contact block is stored as `contact_*` rows in website_settings.

use async_trait::async_trait;
use rusqlite::params;
use serde_json::{Map, Value};

use crate::domain::{ContactInfo, DomainResult};
use crate::repository::db::not_initialized;

/// Trait for contact settings operations
#[async_trait]
pub trait ContactOperations {
    /// Contact block; fields without a stored setting are empty
    async fn load_contact(&self) -> DomainResult<ContactInfo>;

    /// Upsert the known fields of `contact`, ignoring other keys; returns how many were stored
    async fn save_contact(&self, contact: &Map<String, Value>) -> DomainResult<usize>;
}

fn setting_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

#[async_trait]
impl ContactOperations for super::website_repo::WebsiteRepository {
    async fn load_contact(&self) -> DomainResult<ContactInfo> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn.prepare("SELECT setting_key, setting_value FROM website_settings")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut contact = ContactInfo::default();
        for row in rows {
            let (key, value) = row?;
            if let Some((field, _)) = ContactInfo::SETTING_KEYS.iter().find(|(_, k)| *k == key) {
                contact.set_field(field, value);
            }
        }
        Ok(contact)
    }

    async fn save_contact(&self, contact: &Map<String, Value>) -> DomainResult<usize> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_initialized)?;

        let tx = conn.transaction()?;
        let mut stored = 0;
        for (field, value) in contact {
            let Some(key) = ContactInfo::setting_key(field) else {
                tracing::debug!(field = %field, "Ignoring unknown contact field");
                continue;
            };
            tx.execute(
                "INSERT INTO website_settings (setting_key, setting_value) VALUES (?, ?)
                 ON CONFLICT(setting_key) DO UPDATE SET setting_value = excluded.setting_value",
                params![key, setting_value(value)],
            )?;
            stored += 1;
        }
        tx.commit()?;

        tracing::info!(fields = stored, "Contact info saved");
        Ok(stored)
    }
}

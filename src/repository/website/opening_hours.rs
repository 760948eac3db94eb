//! Opening Hours Operations
//!
//! The seven weekday rows seeded by the migrations; only their hours change.

use async_trait::async_trait;
use rusqlite::params;

use crate::domain::{DomainError, DomainResult, OpeningDay, OpeningDayInput};
use crate::repository::db::not_initialized;

/// Trait for opening hours operations
#[async_trait]
pub trait OpeningHoursOperations {
    /// All days in display order
    async fn list_opening_hours(&self) -> DomainResult<Vec<OpeningDay>>;

    /// Set hours per day, matched by id or else by day name; all or nothing
    async fn update_opening_hours(&self, days: &[OpeningDayInput]) -> DomainResult<()>;
}

#[async_trait]
impl OpeningHoursOperations for super::website_repo::WebsiteRepository {
    async fn list_opening_hours(&self) -> DomainResult<Vec<OpeningDay>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn.prepare("SELECT id, day_name, hours FROM opening_hours ORDER BY order_index, id")?;
        let days = stmt
            .query_map([], |row| {
                Ok(OpeningDay {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    hours: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(days)
    }

    async fn update_opening_hours(&self, days: &[OpeningDayInput]) -> DomainResult<()> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_initialized)?;

        let tx = conn.transaction()?;
        for day in days {
            let touched = match (&day.id, &day.name) {
                (Some(id), _) => tx.execute("UPDATE opening_hours SET hours = ? WHERE id = ?", params![day.hours, id])?,
                (None, Some(name)) => tx.execute(
                    "UPDATE opening_hours SET hours = ? WHERE day_name = ?",
                    params![day.hours, name.trim()],
                )?,
                (None, None) => return Err(DomainError::validation("opening day needs an id or a name")),
            };
            if touched == 0 {
                let label = day
                    .id
                    .map(|id| id.to_string())
                    .or_else(|| day.name.clone())
                    .unwrap_or_default();
                return Err(DomainError::not_found(format!("Opening day {} not found", label)));
            }
        }
        tx.commit()?;

        tracing::info!(days = days.len(), "Opening hours updated");
        Ok(())
    }
}

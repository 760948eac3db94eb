//! Menu Sync Operations
//!
//! Transaction boundary for menu saves. Each save runs upserts and pruning in
//! one SQLite transaction; any error drops the transaction, which rolls back
//! every change made so far.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{CategoryInput, DomainResult, NodeKind};
use super::identifier::{classify, IdClass};
use super::reconciler::{PruneMode, Reconciler, SyncReport};
use crate::repository::db::not_initialized;

/// Make storage match the submitted list of categories exactly
pub fn reconcile_menu(conn: &mut Connection, categories: &[CategoryInput]) -> DomainResult<SyncReport> {
    let tx = conn.transaction()?;
    let report = {
        let mut reconciler = Reconciler::begin(&tx)?;
        for (index, category) in categories.iter().enumerate() {
            reconciler.upsert_category(category, index as i32)?;
        }
        reconciler.prune(PruneMode::WholeMenu)?;
        reconciler.report()
    };
    tx.commit()?;
    Ok(report)
}

/// Make one category's subtree match the submission, leaving other categories alone
///
/// A stored category keeps its position; a new one is appended at the end.
/// Nodes pulled in from another category leave that category's order
/// contiguous.
pub fn reconcile_category(conn: &mut Connection, category: &CategoryInput) -> DomainResult<(i64, SyncReport)> {
    let tx = conn.transaction()?;
    let result = {
        let mut reconciler = Reconciler::begin(&tx)?;
        let order_index = category_position(&tx, &reconciler, category)?;
        let id = reconciler.upsert_category(category, order_index)?;
        reconciler.prune(PruneMode::Subtree)?;
        (id, reconciler.report())
    };
    tx.commit()?;
    Ok(result)
}

fn category_position(conn: &Connection, reconciler: &Reconciler<'_>, category: &CategoryInput) -> DomainResult<i32> {
    let class = classify(
        category.id.as_ref(),
        NodeKind::Category,
        reconciler.snapshot.known(NodeKind::Category),
    )?;
    if let IdClass::Existing(id) = class {
        let stored: Option<i32> = conn
            .query_row("SELECT order_index FROM categories WHERE id = ?", params![id], |row| row.get(0))
            .optional()?;
        if let Some(position) = stored {
            return Ok(position);
        }
    }
    let next: i32 = conn.query_row(
        "SELECT COALESCE(MAX(order_index), -1) + 1 FROM categories",
        [],
        |row| row.get(0),
    )?;
    Ok(next)
}

/// Trait for menu save operations
#[async_trait]
pub trait MenuSyncOperations {
    /// Replace the whole menu with the submitted tree
    async fn save_menu(&self, categories: &[CategoryInput]) -> DomainResult<SyncReport>;

    /// Save a single category subtree; returns the category's durable id
    async fn save_category(&self, category: &CategoryInput) -> DomainResult<i64>;
}

#[async_trait]
impl MenuSyncOperations for super::menu_repo::MenuRepository {
    async fn save_menu(&self, categories: &[CategoryInput]) -> DomainResult<SyncReport> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_initialized)?;

        match reconcile_menu(conn, categories) {
            Ok(report) => {
                tracing::info!(
                    categories = categories.len(),
                    inserted = report.inserted,
                    updated = report.updated,
                    deleted = report.deleted,
                    "Menu saved"
                );
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Menu save rolled back");
                Err(e)
            }
        }
    }

    async fn save_category(&self, category: &CategoryInput) -> DomainResult<i64> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_initialized)?;

        match reconcile_category(conn, category) {
            Ok((id, report)) => {
                tracing::info!(
                    category_id = id,
                    inserted = report.inserted,
                    updated = report.updated,
                    deleted = report.deleted,
                    "Category saved"
                );
                Ok(id)
            }
            Err(e) => {
                tracing::warn!(error = %e, category = %category.name, "Category save rolled back");
                Err(e)
            }
        }
    }
}

//! Orphan Pruner
//!
//! Deletes stored nodes the submission left out. Runs after all upserts,
//! deepest level first, and only inside the parent scopes the submission
//! reached. Claims are global to the submission, so a node moved to another
//! parent is never treated as an orphan of its old one.

use rusqlite::params;

use crate::domain::{DomainResult, NodeKind};
use super::reconciler::{PruneMode, Reconciler, Scope};

impl<'a> Reconciler<'a> {
    /// Stored ids in `scope` that nothing in the submission claimed
    fn orphans_in(&self, scope: Scope) -> Vec<i64> {
        let kind = scope.child_kind();
        self.snapshot
            .members(scope)
            .iter()
            .copied()
            .filter(|id| !self.claims.contains(kind, *id))
            .collect()
    }

    pub fn prune(&mut self, mode: PruneMode) -> DomainResult<()> {
        let scopes = self.visited.clone();

        // 1. Items
        for scope in scopes.iter().filter(|s| s.child_kind() == NodeKind::Item) {
            for item_id in self.orphans_in(*scope) {
                let n = self.conn.execute("DELETE FROM items WHERE id = ?", params![item_id])?;
                self.report.deleted += n;
                tracing::debug!(item_id, ?scope, "Pruned item");
            }
        }

        // 2. Subcategories, with whatever items still point at them
        for scope in scopes.iter().filter(|s| s.child_kind() == NodeKind::Subcategory) {
            for subcategory_id in self.orphans_in(*scope) {
                let items = self.conn.execute("DELETE FROM items WHERE subcategory_id = ?", params![subcategory_id])?;
                let subs = self.conn.execute("DELETE FROM subcategories WHERE id = ?", params![subcategory_id])?;
                self.report.deleted += items + subs;
                tracing::debug!(subcategory_id, items, "Pruned subcategory");
            }
        }

        // 3. Categories, children first
        if mode == PruneMode::WholeMenu {
            for category_id in self.orphans_in(Scope::Menu) {
                let items = self.conn.execute("DELETE FROM items WHERE category_id = ?", params![category_id])?;
                let subs = self.conn.execute("DELETE FROM subcategories WHERE category_id = ?", params![category_id])?;
                let cats = self.conn.execute("DELETE FROM categories WHERE id = ?", params![category_id])?;
                self.report.deleted += items + subs + cats;
                tracing::debug!(category_id, items, subcategories = subs, "Pruned category");
            }
        }

        if mode == PruneMode::Subtree {
            self.close_gaps()?;
        }

        Ok(())
    }

    /// Renumber sibling groups outside the submission that lost members to it
    ///
    /// A subtree save may pull a node out of a category it did not submit;
    /// the remaining siblings keep their stored order and get 0..n again.
    fn close_gaps(&mut self) -> DomainResult<()> {
        let mut sources: Vec<(Scope, Vec<i64>)> = Vec::new();
        for (scope, members) in self.snapshot.scopes() {
            // categories are never pulled out of the menu
            if scope == Scope::Menu || self.visited.contains(&scope) {
                continue;
            }
            let kind = scope.child_kind();
            if !members.iter().any(|id| self.claims.contains(kind, *id)) {
                continue;
            }
            let remaining = members
                .iter()
                .copied()
                .filter(|id| !self.claims.contains(kind, *id))
                .collect();
            sources.push((scope, remaining));
        }

        for (scope, remaining) in sources {
            let sql = format!("UPDATE {} SET order_index = ? WHERE id = ?", scope.child_kind().table());
            for (position, id) in remaining.iter().enumerate() {
                self.report.updated += self.conn.execute(&sql, params![position as i32, id])?;
            }
            tracing::debug!(?scope, remaining = remaining.len(), "Closed order gap");
        }
        Ok(())
    }
}

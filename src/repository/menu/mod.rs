//! Menu Repository Module
//!
//! This module provides menu repository functionality split into specialized sub-modules:
//! - menu_repo: Reading the category / subcategory / item tree
//! - identifier: New vs. stored id classification
//! - reconciler: Per-save state (snapshot, claims, visited scopes)
//! - upsert: Insert-or-update of submitted nodes
//! - prune: Deletion of nodes missing from a submission
//! - menu_sync: Transaction boundary and the async save operations

mod identifier;
mod menu_repo;
mod menu_sync;
mod prune;
mod reconciler;
mod upsert;

pub use identifier::{classify, IdClass};
pub use menu_repo::{read_menu, MenuRepository};
pub use menu_sync::{reconcile_category, reconcile_menu, MenuSyncOperations};
pub use reconciler::{MenuSnapshot, PruneMode, Scope, SyncReport};

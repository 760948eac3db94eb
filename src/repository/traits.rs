//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces for data access.

use async_trait::async_trait;
use crate::domain::{Entity, DomainResult};

/// Read access shared by the flat tables
///
/// Writes differ per table (bulk reconcile for reservations, file-backed
/// uploads for the gallery) and live on the repositories themselves. The
/// menu tree has its own operations in `menu`.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// List all entities in display order
    async fn list(&self) -> DomainResult<Vec<T>>;
}

//! Repository Layer
//!
//! Data access abstractions and implementations.

mod traits;
mod db;
mod reservation_repo;
pub mod menu;
pub mod website;


pub use traits::Repository;
pub use db::{init_db, DbState};
pub use menu::{MenuRepository, MenuSyncOperations, SyncReport};
pub use reservation_repo::{ReservationRepository, StatusChange, Submission};
pub use website::{
    ContactOperations, GalleryRepository, GallerySettings, OpeningHoursOperations, WebsiteRepository,
};

//! Website Repository Module
//!
//! Public site content besides the menu, split into sub-modules:
//! - website_repo: Repository shared by hours and contact settings
//! - opening_hours: Weekday opening hours
//! - contact: Contact block stored as key/value settings
//! - gallery: Gallery rows and their image files

mod contact;
mod gallery;
mod opening_hours;
mod website_repo;

pub use gallery::{seo_slug, GalleryRepository, GallerySettings};
pub use website_repo::WebsiteRepository;

// Re-export all operation traits so they can be used by importing WebsiteRepository
pub use contact::ContactOperations;
pub use opening_hours::OpeningHoursOperations;

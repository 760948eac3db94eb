//! Domain Layer
//!
//! Contains all domain entities, submitted payload shapes and the error type.
//! No I/O happens here.

mod entity;
mod menu;
mod reservation;
mod website;

pub use entity::{Entity, DomainError, DomainResult};
pub use menu::{
    parse_category_payload, parse_menu_payload, round_price, Category, CategoryInput,
    CategoryNode, ItemInput, MenuItem, NodeKind, RawId, RawPrice, Subcategory,
    SubcategoryInput, SubcategoryNode, DEFAULT_BADGE_TEXT, DEFAULT_BG_COLOR,
};
pub use reservation::{parse_date, parse_time, Reservation, ReservationInput, ReservationStatus};
pub use website::{
    ContactInfo, GalleryImage, GalleryImageInput, GalleryUpload, ImageRef, OpeningDay,
    OpeningDayInput, WebsiteData, WebsiteUpdate, DEFAULT_DAYS,
};

//! Website Content Entities
//!
//! Opening hours, contact details and the photo gallery shown on the public site.

use serde::{Deserialize, Serialize};
use super::entity::Entity;

pub const DEFAULT_DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningDay {
    pub id: i64,
    /// Day label as displayed, e.g. "Monday"
    pub name: String,
    /// Free text, e.g. "18:00 - 00:00"
    pub hours: String,
}

/// Opening hours update: matched by id when given, else by day name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningDayInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    pub hours: String,
}

/// Contact block; stored as key/value settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub street: String,
    pub city: String,
    pub phone: String,
    pub email: String,
    pub instagram: String,
}

impl ContactInfo {
    /// (field, setting key) pairs
    pub const SETTING_KEYS: [(&'static str, &'static str); 6] = [
        ("name", "contact_name"),
        ("street", "contact_street"),
        ("city", "contact_city"),
        ("phone", "contact_phone"),
        ("email", "contact_email"),
        ("instagram", "contact_instagram"),
    ];

    pub fn setting_key(field: &str) -> Option<&'static str> {
        Self::SETTING_KEYS
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, key)| *key)
    }

    pub fn set_field(&mut self, field: &str, value: String) {
        match field {
            "name" => self.name = value,
            "street" => self.street = value,
            "city" => self.city = value,
            "phone" => self.phone = value,
            "email" => self.email = value,
            "instagram" => self.instagram = value,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: i64,
    /// Public URL path, e.g. "/images/gallery/bistro-terrace-3fa1c.webp"
    pub src: String,
    pub alt: String,
    pub description: String,
    /// Layout hint for the grid, e.g. "col-span-2"
    pub span: String,
    #[serde(skip_serializing, default)]
    pub order_index: i32,
}

impl Entity for GalleryImage {
    type Id = i64;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Reference to a gallery image: a numeric id, or the src for placeholder ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Id(i64),
    Text(String),
}

impl ImageRef {
    /// Numeric ids, including numeric strings
    pub fn numeric(&self) -> Option<i64> {
        match self {
            ImageRef::Id(id) => Some(*id),
            ImageRef::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryImageInput {
    pub id: ImageRef,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub span: String,
}

/// Admin website mutation, tagged by `type`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WebsiteUpdate {
    OpeningHours { days: Vec<OpeningDayInput> },
    ContactInfo { contact: serde_json::Map<String, serde_json::Value> },
    UpdateImage { image: GalleryImageInput },
    DeleteImage { id: ImageRef },
    ReorderImages { ids: Vec<ImageRef> },
}

impl WebsiteUpdate {
    pub fn kind(&self) -> &'static str {
        match self {
            WebsiteUpdate::OpeningHours { .. } => "opening_hours",
            WebsiteUpdate::ContactInfo { .. } => "contact_info",
            WebsiteUpdate::UpdateImage { .. } => "update_image",
            WebsiteUpdate::DeleteImage { .. } => "delete_image",
            WebsiteUpdate::ReorderImages { .. } => "reorder_images",
        }
    }
}

/// Base64 encoded gallery upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryUpload {
    /// Original file name, used for the SEO slug and extension
    pub filename: String,
    pub data: String,
    #[serde(default)]
    pub alt: String,
}

/// Everything the public site needs besides the menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteData {
    pub days: Vec<OpeningDay>,
    pub contact: ContactInfo,
    pub images: Vec<GalleryImage>,
}

//! Gallery Repository
//!
//! Gallery rows plus the image files behind them. Files live in one
//! directory and are served under a URL prefix; a row's `src` is that prefix
//! plus the file name.

use async_trait::async_trait;
use base64::Engine;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;

use crate::domain::{
    DomainError, DomainResult, GalleryImage, GalleryImageInput, GalleryUpload, ImageRef,
};
use crate::repository::db::not_initialized;
use crate::repository::traits::Repository;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];
const DEFAULT_ALT: &str = "Gallery image";

/// Where gallery files are stored and how they are named
#[derive(Debug, Clone)]
pub struct GallerySettings {
    pub dir: PathBuf,
    /// Public URL prefix, with trailing slash
    pub url_prefix: String,
    /// Leading part of uploaded file names
    pub file_prefix: String,
}

impl GallerySettings {
    pub fn src_for(&self, file_name: &str) -> String {
        format!("{}{}", self.url_prefix, file_name)
    }

    /// File behind `src`, if it points into the gallery directory
    pub fn file_for(&self, src: &str) -> Option<PathBuf> {
        let name = src.strip_prefix(&self.url_prefix)?;
        let valid = !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != "..";
        valid.then(|| self.dir.join(name))
    }
}

/// Lowercased file stem with every run of non `[a-z0-9]` replaced by `-`
pub fn seo_slug(stem: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let re = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("NON_ALNUM is a valid regex pattern"));

    let lowered = stem.to_lowercase();
    let slug = re.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "gallery-image".to_string()
    } else {
        slug.to_string()
    }
}

/// Lowercase extension of an accepted image file name
fn image_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// `<prefix>-<slug>-<5 hex>.<ext>` for an upload
pub fn upload_file_name(prefix: &str, original: &str, data: &[u8]) -> DomainResult<String> {
    let path = Path::new(original);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_else(|| "webp".to_string());
    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Err(DomainError::validation(format!("'{}' is not an image file", original)));
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let mut hasher = blake3::Hasher::new();
    hasher.update(data);
    hasher.update(&chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
    let hash = hasher.finalize().to_hex();

    Ok(format!("{}-{}-{}.{}", prefix, seo_slug(stem), &hash.as_str()[..5], ext))
}

fn row_to_image(row: &rusqlite::Row) -> rusqlite::Result<GalleryImage> {
    Ok(GalleryImage {
        id: row.get(0)?,
        src: row.get(1)?,
        alt: row.get(2)?,
        description: row.get(3)?,
        span: row.get(4)?,
        order_index: row.get(5)?,
    })
}

fn next_order(conn: &Connection) -> DomainResult<i32> {
    let next = conn.query_row(
        "SELECT COALESCE(MAX(order_index), -1) + 1 FROM gallery_images",
        [],
        |row| row.get(0),
    )?;
    Ok(next)
}

fn find_image(conn: &Connection, image: &ImageRef) -> DomainResult<Option<GalleryImage>> {
    let found = match image.numeric() {
        Some(id) => conn
            .query_row(
                "SELECT id, src, alt, description, span, order_index FROM gallery_images WHERE id = ?",
                params![id],
                row_to_image,
            )
            .optional()?,
        None => {
            let ImageRef::Text(src) = image else { return Ok(None) };
            conn.query_row(
                "SELECT id, src, alt, description, span, order_index FROM gallery_images WHERE src = ?",
                params![src],
                row_to_image,
            )
            .optional()?
        }
    };
    Ok(found)
}

fn insert_image(conn: &Connection, src: &str, alt: &str) -> DomainResult<GalleryImage> {
    let order_index = next_order(conn)?;
    conn.execute(
        "INSERT INTO gallery_images (src, alt, description, span, order_index) VALUES (?, ?, '', '', ?)",
        params![src, alt, order_index],
    )?;
    Ok(GalleryImage {
        id: conn.last_insert_rowid(),
        src: src.to_string(),
        alt: alt.to_string(),
        description: String::new(),
        span: String::new(),
        order_index,
    })
}

/// SQLite + filesystem implementation of the gallery repository
pub struct GalleryRepository {
    conn: Arc<Mutex<Option<Connection>>>,
    settings: GallerySettings,
}

impl GalleryRepository {
    pub fn new(conn: Arc<Mutex<Option<Connection>>>, settings: GallerySettings) -> Self {
        Self { conn, settings }
    }

    pub fn settings(&self) -> &GallerySettings {
        &self.settings
    }

    /// Add rows for image files in the gallery directory that have none yet
    ///
    /// New files are appended in file name order. Returns how many were added.
    pub async fn sync_directory(&self) -> DomainResult<usize> {
        let mut files = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.settings.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if image_extension(name).is_some() {
                    files.push(name.to_string());
                }
            }
        }
        files.sort();

        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_initialized)?;
        let tx = conn.transaction()?;

        let existing: HashSet<String> = {
            let mut stmt = tx.prepare("SELECT src FROM gallery_images")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect::<Result<_, _>>()?
        };

        let mut added = 0;
        for name in files {
            let src = self.settings.src_for(&name);
            if existing.contains(&src) {
                continue;
            }
            insert_image(&tx, &src, DEFAULT_ALT)?;
            added += 1;
        }
        tx.commit()?;

        if added > 0 {
            tracing::info!(added, dir = %self.settings.dir.display(), "Gallery directory synced");
        }
        Ok(added)
    }

    /// Update alt, description and span, found by numeric id or else by src
    pub async fn update_image(&self, input: &GalleryImageInput) -> DomainResult<GalleryImage> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let target = match input.id.numeric() {
            Some(id) => ImageRef::Id(id),
            None => {
                let src = input
                    .src
                    .clone()
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| DomainError::validation("image without numeric id needs a src"))?;
                ImageRef::Text(src)
            }
        };
        let mut image = find_image(conn, &target)?
            .ok_or_else(|| DomainError::not_found("Gallery image not found"))?;

        conn.execute(
            "UPDATE gallery_images SET alt = ?, description = ?, span = ? WHERE id = ?",
            params![input.alt, input.description, input.span, image.id],
        )?;
        image.alt = input.alt.clone();
        image.description = input.description.clone();
        image.span = input.span.clone();
        Ok(image)
    }

    /// Delete the row and, when it lives in the gallery directory, the file
    pub async fn delete_image(&self, image: &ImageRef) -> DomainResult<GalleryImage> {
        let removed = {
            let guard = self.conn.lock().await;
            let conn = guard.as_ref().ok_or_else(not_initialized)?;

            let found = find_image(conn, image)?
                .ok_or_else(|| DomainError::not_found("Gallery image not found"))?;
            conn.execute("DELETE FROM gallery_images WHERE id = ?", params![found.id])?;
            found
        };

        if let Some(path) = self.settings.file_for(&removed.src) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::info!(path = %path.display(), "Removed gallery file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove gallery file"),
            }
        }
        Ok(removed)
    }

    /// order_index = position in `ids`; non-numeric ids are skipped
    pub async fn reorder_images(&self, ids: &[ImageRef]) -> DomainResult<()> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_initialized)?;

        let tx = conn.transaction()?;
        for (position, image) in ids.iter().enumerate() {
            if let Some(id) = image.numeric() {
                tx.execute(
                    "UPDATE gallery_images SET order_index = ? WHERE id = ?",
                    params![position as i32, id],
                )?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Decode, write under an SEO file name and append to the gallery
    pub async fn upload(&self, upload: &GalleryUpload) -> DomainResult<GalleryImage> {
        let encoded = upload
            .data
            .split_once(";base64,")
            .map(|(_, data)| data)
            .unwrap_or(&upload.data);
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| DomainError::validation(format!("image data is not valid base64: {}", e)))?;
        if bytes.is_empty() {
            return Err(DomainError::validation("image data is empty"));
        }

        let file_name = upload_file_name(&self.settings.file_prefix, &upload.filename, &bytes)?;
        tokio::fs::create_dir_all(&self.settings.dir).await?;
        let path = self.settings.dir.join(&file_name);
        tokio::fs::write(&path, &bytes).await?;

        let src = self.settings.src_for(&file_name);
        let inserted = {
            let guard = self.conn.lock().await;
            match guard.as_ref() {
                Some(conn) => insert_image(conn, &src, upload.alt.trim()),
                None => Err(not_initialized()),
            }
        };

        match inserted {
            Ok(image) => {
                tracing::info!(id = image.id, src = %image.src, bytes = bytes.len(), "Gallery image uploaded");
                Ok(image)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&path).await;
                Err(e)
            }
        }
    }
}

#[async_trait]
impl Repository<GalleryImage> for GalleryRepository {
    async fn list(&self) -> DomainResult<Vec<GalleryImage>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn.prepare(
            "SELECT id, src, alt, description, span, order_index FROM gallery_images ORDER BY order_index, id",
        )?;
        let images = stmt.query_map([], row_to_image)?.collect::<Result<Vec<_>, _>>()?;
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> GallerySettings {
        GallerySettings {
            dir: PathBuf::from("/srv/gallery"),
            url_prefix: "/images/gallery/".to_string(),
            file_prefix: "bistro".to_string(),
        }
    }

    #[test]
    fn test_seo_slug() {
        assert_eq!(seo_slug("Terrasse im Sommer!"), "terrasse-im-sommer");
        assert_eq!(seo_slug("__IMG_0042__"), "img-0042");
        assert_eq!(seo_slug("äöü"), "gallery-image");
    }

    #[test]
    fn test_upload_file_name() {
        let name = upload_file_name("bistro", "Our Terrace.JPG", b"bytes").unwrap();
        let re = Regex::new(r"^bistro-our-terrace-[0-9a-f]{5}\.jpg$").unwrap();
        assert!(re.is_match(&name), "{}", name);

        let name = upload_file_name("bistro", "no-extension", b"bytes").unwrap();
        assert!(name.ends_with(".webp"));
    }

    #[test]
    fn test_upload_rejects_non_images() {
        let err = upload_file_name("bistro", "notes.txt", b"bytes").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_upload_accepts_only_gallery_formats() {
        for name in ["logo.svg", "anim.GIF", "scan.bmp"] {
            assert!(upload_file_name("bistro", name, b"bytes").is_err(), "{} accepted", name);
        }
        assert!(upload_file_name("bistro", "photo.JPEG", b"bytes").unwrap().ends_with(".jpeg"));
    }

    #[test]
    fn test_file_for_stays_in_gallery() {
        let s = settings();
        assert_eq!(
            s.file_for("/images/gallery/a.webp"),
            Some(PathBuf::from("/srv/gallery/a.webp"))
        );
        assert_eq!(s.file_for("/images/gallery/../db.sqlite"), None);
        assert_eq!(s.file_for("https://cdn.example.com/a.webp"), None);
    }

    #[test]
    fn test_image_extension_filter() {
        assert_eq!(image_extension("a.JPEG").as_deref(), Some("jpeg"));
        assert_eq!(image_extension("a.gif"), None);
        assert_eq!(image_extension("README"), None);
    }
}

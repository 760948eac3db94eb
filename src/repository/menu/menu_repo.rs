//! Menu Repository - Reading the Tree
//!
//! SQLite-backed access to categories, subcategories and items.
//! Saving lives in menu_sync.

use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{Category, CategoryNode, DomainResult, MenuItem, Subcategory, SubcategoryNode};
use crate::repository::db::not_initialized;

/// SQLite implementation of the menu repository
pub struct MenuRepository {
    pub(super) conn: Arc<Mutex<Option<Connection>>>,
}

impl MenuRepository {
    pub fn new(conn: Arc<Mutex<Option<Connection>>>) -> Self {
        Self { conn }
    }

    /// The whole menu, every level in display order
    pub async fn load_menu(&self) -> DomainResult<Vec<CategoryNode>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;
        read_menu(conn)
    }
}

pub fn read_menu(conn: &Connection) -> DomainResult<Vec<CategoryNode>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, is_special, bg_color, badge_text, order_index
         FROM categories ORDER BY order_index, id",
    )?;
    let categories = stmt
        .query_map([], row_to_category)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT id, category_id, name, order_index
         FROM subcategories ORDER BY order_index, id",
    )?;
    let mut subcategories: HashMap<i64, Vec<Subcategory>> = HashMap::new();
    for sub in stmt.query_map([], row_to_subcategory)? {
        let sub = sub?;
        subcategories.entry(sub.category_id).or_default().push(sub);
    }

    let mut stmt = conn.prepare(
        "SELECT id, category_id, subcategory_id, name, price, unit, info, allergens, order_index
         FROM items ORDER BY order_index, id",
    )?;
    let mut direct_items: HashMap<i64, Vec<MenuItem>> = HashMap::new();
    let mut nested_items: HashMap<i64, Vec<MenuItem>> = HashMap::new();
    for item in stmt.query_map([], row_to_item)? {
        let item = item?;
        match item.subcategory_id {
            Some(sub_id) => nested_items.entry(sub_id).or_default().push(item),
            None => direct_items.entry(item.category_id).or_default().push(item),
        }
    }

    let tree = categories
        .into_iter()
        .map(|category| {
            let subcategories = subcategories
                .remove(&category.id)
                .unwrap_or_default()
                .into_iter()
                .map(|subcategory| SubcategoryNode {
                    items: nested_items.remove(&subcategory.id).unwrap_or_default(),
                    subcategory,
                })
                .collect();
            CategoryNode {
                items: direct_items.remove(&category.id).unwrap_or_default(),
                subcategories,
                category,
            }
        })
        .collect();

    Ok(tree)
}

/// Convert a database row to Category
pub(super) fn row_to_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        is_special: row.get(2)?,
        bg_color: row.get(3)?,
        badge_text: row.get(4)?,
        order_index: row.get(5)?,
    })
}

pub(super) fn row_to_subcategory(row: &rusqlite::Row) -> rusqlite::Result<Subcategory> {
    Ok(Subcategory {
        id: row.get(0)?,
        category_id: row.get(1)?,
        name: row.get(2)?,
        order_index: row.get(3)?,
    })
}

pub(super) fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<MenuItem> {
    Ok(MenuItem {
        id: row.get(0)?,
        category_id: row.get(1)?,
        subcategory_id: row.get(2)?,
        name: row.get(3)?,
        price: row.get(4)?,
        unit: row.get(5)?,
        info: row.get(6)?,
        allergens: row.get(7)?,
        order_index: row.get(8)?,
    })
}

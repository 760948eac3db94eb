//! Upsert Executor
//!
//! Walks the submitted tree top-down, inserting new nodes and updating stored
//! ones in place. Every node gets `order_index` = its position among siblings.

use rusqlite::params;
use std::collections::HashMap;

use crate::domain::{
    CategoryInput, DomainError, DomainResult, ItemInput, NodeKind, SubcategoryInput,
    DEFAULT_BADGE_TEXT, DEFAULT_BG_COLOR,
};
use super::identifier::{classify, IdClass};
use super::reconciler::{Reconciler, Scope};

fn require_name<'n>(kind: NodeKind, name: &'n str) -> DomainResult<&'n str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation(format!("{} name is required", kind.as_str())));
    }
    Ok(name)
}

impl<'a> Reconciler<'a> {
    /// Upsert a category and everything below it; returns its durable id
    pub fn upsert_category(&mut self, input: &CategoryInput, order_index: i32) -> DomainResult<i64> {
        let name = require_name(NodeKind::Category, &input.name)?;
        let bg_color = input.bg_color.as_deref().unwrap_or(DEFAULT_BG_COLOR);
        let badge_text = input.badge_text.as_deref().unwrap_or(DEFAULT_BADGE_TEXT);

        let class = classify(
            input.id.as_ref(),
            NodeKind::Category,
            self.snapshot.known(NodeKind::Category),
        )?;
        let category_id = match class {
            IdClass::Existing(id) => {
                self.conn.execute(
                    "UPDATE categories SET name = ?, is_special = ?, bg_color = ?, badge_text = ?, order_index = ? WHERE id = ?",
                    params![name, input.is_special, bg_color, badge_text, order_index, id],
                )?;
                self.report.updated += 1;
                id
            }
            IdClass::New => {
                self.conn.execute(
                    "INSERT INTO categories (name, is_special, bg_color, badge_text, order_index) VALUES (?, ?, ?, ?, ?)",
                    params![name, input.is_special, bg_color, badge_text, order_index],
                )?;
                self.report.inserted += 1;
                self.conn.last_insert_rowid()
            }
        };
        self.claims.claim(NodeKind::Category, category_id)?;
        self.visit(Scope::Subcategories(category_id));
        self.visit(Scope::CategoryItems(category_id));

        self.upsert_category_children(input, category_id)?;

        Ok(category_id)
    }

    /// Subcategories first (each with its items), then the direct items
    fn upsert_category_children(&mut self, input: &CategoryInput, category_id: i64) -> DomainResult<()> {
        // Submitted subcategory id -> position among the siblings
        let mut sibling_keys: HashMap<String, usize> = HashMap::new();
        for (index, sub) in input.subcategories.iter().enumerate() {
            if let Some(raw) = &sub.id {
                if sibling_keys.insert(raw.key(), index).is_some() {
                    return Err(DomainError::validation(format!(
                        "subcategory id '{}' is used twice in category '{}'",
                        raw, input.name
                    )));
                }
            }
        }

        // Category-level items linked to a sibling subcategory
        let mut linked: Vec<Vec<&ItemInput>> = vec![Vec::new(); input.subcategories.len()];
        let mut direct: Vec<&ItemInput> = Vec::new();
        for item in &input.items {
            match item.subcategory_id.as_ref().filter(|raw| !raw.is_blank()) {
                Some(raw) => {
                    let index = sibling_keys.get(&raw.key()).ok_or_else(|| {
                        DomainError::validation(format!(
                            "item '{}' references subcategory '{}' which is not part of category '{}'",
                            item.name, raw, input.name
                        ))
                    })?;
                    linked[*index].push(item);
                }
                None => direct.push(item),
            }
        }

        for (index, (sub, linked_items)) in input.subcategories.iter().zip(linked).enumerate() {
            let subcategory_id = self.upsert_subcategory(sub, category_id, index as i32)?;
            let group = sub.items.iter().chain(linked_items);
            for (position, item) in group.enumerate() {
                self.upsert_item(item, category_id, Some(subcategory_id), position as i32)?;
            }
        }

        for (position, item) in direct.into_iter().enumerate() {
            self.upsert_item(item, category_id, None, position as i32)?;
        }

        Ok(())
    }

    fn upsert_subcategory(&mut self, input: &SubcategoryInput, category_id: i64, order_index: i32) -> DomainResult<i64> {
        let name = require_name(NodeKind::Subcategory, &input.name)?;

        let class = classify(
            input.id.as_ref(),
            NodeKind::Subcategory,
            self.snapshot.known(NodeKind::Subcategory),
        )?;
        let subcategory_id = match class {
            IdClass::Existing(id) => {
                self.conn.execute(
                    "UPDATE subcategories SET category_id = ?, name = ?, order_index = ? WHERE id = ?",
                    params![category_id, name, order_index, id],
                )?;
                self.report.updated += 1;
                id
            }
            IdClass::New => {
                self.conn.execute(
                    "INSERT INTO subcategories (category_id, name, order_index) VALUES (?, ?, ?)",
                    params![category_id, name, order_index],
                )?;
                self.report.inserted += 1;
                self.conn.last_insert_rowid()
            }
        };
        self.claims.claim(NodeKind::Subcategory, subcategory_id)?;
        self.visit(Scope::SubcategoryItems(subcategory_id));

        Ok(subcategory_id)
    }

    fn upsert_item(
        &mut self,
        input: &ItemInput,
        category_id: i64,
        subcategory_id: Option<i64>,
        order_index: i32,
    ) -> DomainResult<i64> {
        let name = require_name(NodeKind::Item, &input.name)?;
        let price = input
            .price
            .amount()
            .map_err(|e| DomainError::validation(format!("item '{}': {}", name, e.message())))?;
        let unit = input.unit.as_deref().unwrap_or("");
        let info = input.info.as_deref().unwrap_or("");
        let allergens = input.allergens.as_deref().unwrap_or("");

        let class = classify(input.id.as_ref(), NodeKind::Item, self.snapshot.known(NodeKind::Item))?;
        let item_id = match class {
            IdClass::Existing(id) => {
                self.conn.execute(
                    "UPDATE items SET category_id = ?, subcategory_id = ?, name = ?, price = ?, unit = ?, info = ?, allergens = ?, order_index = ? WHERE id = ?",
                    params![category_id, subcategory_id, name, price, unit, info, allergens, order_index, id],
                )?;
                self.report.updated += 1;
                id
            }
            IdClass::New => {
                self.conn.execute(
                    "INSERT INTO items (category_id, subcategory_id, name, price, unit, info, allergens, order_index) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                    params![category_id, subcategory_id, name, price, unit, info, allergens, order_index],
                )?;
                self.report.inserted += 1;
                self.conn.last_insert_rowid()
            }
        };
        self.claims.claim(NodeKind::Item, item_id)?;

        Ok(item_id)
    }
}

//! Reconciliation State
//!
//! `Reconciler` carries everything one menu save needs: the open transaction,
//! the ids stored before the save started, the ids the submission claimed and
//! the parent scopes it touched. Upserts live in `upsert`, deletions in `prune`.

use rusqlite::Connection;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::domain::{DomainError, DomainResult, NodeKind};

/// A sibling group in the stored tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Top-level categories
    Menu,
    /// Subcategories of a category
    Subcategories(i64),
    /// Items directly under a category
    CategoryItems(i64),
    /// Items inside a subcategory
    SubcategoryItems(i64),
}

impl Scope {
    pub fn child_kind(&self) -> NodeKind {
        match self {
            Scope::Menu => NodeKind::Category,
            Scope::Subcategories(_) => NodeKind::Subcategory,
            Scope::CategoryItems(_) | Scope::SubcategoryItems(_) => NodeKind::Item,
        }
    }
}

/// Ids present in storage when the reconciliation started
#[derive(Debug, Default)]
pub struct MenuSnapshot {
    categories: HashSet<i64>,
    subcategories: HashSet<i64>,
    items: HashSet<i64>,
    members: HashMap<Scope, Vec<i64>>,
}

impl MenuSnapshot {
    pub fn load(conn: &Connection) -> DomainResult<Self> {
        let mut snapshot = MenuSnapshot::default();

        let mut stmt = conn.prepare("SELECT id FROM categories ORDER BY order_index, id")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        for id in rows {
            let id = id?;
            snapshot.categories.insert(id);
            snapshot.members.entry(Scope::Menu).or_default().push(id);
        }

        let mut stmt = conn.prepare("SELECT id, category_id FROM subcategories ORDER BY order_index, id")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (id, category_id) = row?;
            snapshot.subcategories.insert(id);
            snapshot.members.entry(Scope::Subcategories(category_id)).or_default().push(id);
        }

        let mut stmt = conn.prepare("SELECT id, category_id, subcategory_id FROM items ORDER BY order_index, id")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, Option<i64>>(2)?))
        })?;
        for row in rows {
            let (id, category_id, subcategory_id) = row?;
            snapshot.items.insert(id);
            let scope = match subcategory_id {
                Some(sub) => Scope::SubcategoryItems(sub),
                None => Scope::CategoryItems(category_id),
            };
            snapshot.members.entry(scope).or_default().push(id);
        }

        Ok(snapshot)
    }

    pub fn known(&self, kind: NodeKind) -> &HashSet<i64> {
        match kind {
            NodeKind::Category => &self.categories,
            NodeKind::Subcategory => &self.subcategories,
            NodeKind::Item => &self.items,
        }
    }

    /// Every non-empty sibling group as it was stored
    pub fn scopes(&self) -> impl Iterator<Item = (Scope, &[i64])> {
        self.members.iter().map(|(scope, ids)| (*scope, ids.as_slice()))
    }

    /// Ids stored in `scope` before the save, in their stored order
    pub fn members(&self, scope: Scope) -> &[i64] {
        self.members.get(&scope).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Ids the submission resolved to, per kind
#[derive(Debug, Default)]
pub struct Claims {
    categories: HashSet<i64>,
    subcategories: HashSet<i64>,
    items: HashSet<i64>,
}

impl Claims {
    fn set(&self, kind: NodeKind) -> &HashSet<i64> {
        match kind {
            NodeKind::Category => &self.categories,
            NodeKind::Subcategory => &self.subcategories,
            NodeKind::Item => &self.items,
        }
    }

    /// Record an id; a second claim means the same row was submitted twice
    pub fn claim(&mut self, kind: NodeKind, id: i64) -> DomainResult<()> {
        let set = match kind {
            NodeKind::Category => &mut self.categories,
            NodeKind::Subcategory => &mut self.subcategories,
            NodeKind::Item => &mut self.items,
        };
        if !set.insert(id) {
            return Err(DomainError::validation(format!(
                "{} {} appears more than once in the menu",
                kind.as_str(),
                id
            )));
        }
        Ok(())
    }

    pub fn contains(&self, kind: NodeKind, id: i64) -> bool {
        self.set(kind).contains(&id)
    }
}

/// Row counts touched by one reconciliation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

/// Which levels the pruner may delete from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneMode {
    /// The submission is the whole menu: unclaimed categories go too
    WholeMenu,
    /// Only the scopes below the submitted categories
    Subtree,
}

pub struct Reconciler<'a> {
    pub(super) conn: &'a Connection,
    pub(super) snapshot: MenuSnapshot,
    pub(super) claims: Claims,
    /// Parent scopes in the order the submission reached them
    pub(super) visited: Vec<Scope>,
    pub(super) report: SyncReport,
}

impl<'a> Reconciler<'a> {
    /// Start a reconciliation on an open transaction
    pub fn begin(conn: &'a Connection) -> DomainResult<Self> {
        Ok(Self {
            conn,
            snapshot: MenuSnapshot::load(conn)?,
            claims: Claims::default(),
            visited: Vec::new(),
            report: SyncReport::default(),
        })
    }

    pub fn report(&self) -> SyncReport {
        self.report
    }

    pub(super) fn visit(&mut self, scope: Scope) {
        if !self.visited.contains(&scope) {
            self.visited.push(scope);
        }
    }
}

//! Identifier Classification
//!
//! Decides whether a submitted node is new or refers to a stored row.

use std::collections::HashSet;

use crate::domain::{DomainError, DomainResult, NodeKind, RawId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdClass {
    /// Insert a fresh row
    New,
    /// Update the stored row with this id
    Existing(i64),
}

/// Classify a submitted id against the ids of `kind` stored before the sync
///
/// A durable-looking id missing from `known` was deleted since the client
/// loaded the menu; it is re-inserted rather than failing the whole save.
pub fn classify(raw: Option<&RawId>, kind: NodeKind, known: &HashSet<i64>) -> DomainResult<IdClass> {
    let candidate = match raw {
        None => return Ok(IdClass::New),
        Some(RawId::Int(n)) => *n,
        Some(RawId::Float(f)) => {
            return Err(DomainError::validation(format!(
                "{} id {} is not an integer",
                kind.as_str(),
                f
            )))
        }
        Some(RawId::Text(s)) => {
            let s = s.trim();
            if s.is_empty() || s.starts_with(kind.temp_prefix()) {
                return Ok(IdClass::New);
            }
            s.parse::<i64>().map_err(|_| {
                DomainError::validation(format!(
                    "{} id '{}' is neither a stored id nor a '{}' temporary id",
                    kind.as_str(),
                    s,
                    kind.temp_prefix()
                ))
            })?
        }
    };

    if candidate <= 0 {
        return Err(DomainError::validation(format!(
            "{} id {} is out of range",
            kind.as_str(),
            candidate
        )));
    }

    if known.contains(&candidate) {
        Ok(IdClass::Existing(candidate))
    } else {
        tracing::warn!(kind = kind.as_str(), id = candidate, "Stored id no longer exists, inserting anew");
        Ok(IdClass::New)
    }
}

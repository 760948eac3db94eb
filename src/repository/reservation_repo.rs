//! Reservation Repository
//!
//! SQLite-backed reservations: public submissions, the staff list and the
//! bulk save from the admin panel.

use async_trait::async_trait;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult, Reservation, ReservationInput, ReservationStatus};
use super::db::not_initialized;
use super::traits::Repository;

const COLUMNS: &str =
    "id, name, email, phone, guests, date, time, comment, status, rejection_reason, created_at";

/// Result of a public submission
#[derive(Debug, Clone)]
pub struct Submission {
    pub reservation: Reservation,
    /// True when the id matched a stored reservation
    pub updated: bool,
}

/// A reservation whose status moved during a bulk save
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub reservation: Reservation,
    pub previous: ReservationStatus,
}

/// SQLite implementation of the reservation repository
pub struct ReservationRepository {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl ReservationRepository {
    pub fn new(conn: Arc<Mutex<Option<Connection>>>) -> Self {
        Self { conn }
    }

    /// Store a reservation from the public form
    ///
    /// A known id updates the stored guest details; status and rejection
    /// reason stay as staff left them.
    pub async fn submit(&self, input: ReservationInput) -> DomainResult<Submission> {
        input.validate()?;

        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let requested = input.id.clone().filter(|id| !id.trim().is_empty());
        let stored = match &requested {
            Some(id) => find_reservation(conn, id)?,
            None => None,
        };

        let submission = match stored {
            Some(existing) => {
                let mut reservation = input.into_reservation(existing.id.clone(), existing.created_at.clone())?;
                reservation.status = existing.status;
                reservation.rejection_reason = existing.rejection_reason;
                reservation.created_at = existing.created_at;
                write_reservation(conn, &reservation)?;
                Submission { reservation, updated: true }
            }
            None => {
                let id = match requested {
                    Some(id) => id,
                    None => generate_id(conn)?,
                };
                let mut reservation = input.into_reservation(id, now())?;
                reservation.status = ReservationStatus::Pending;
                reservation.rejection_reason = None;
                insert_reservation(conn, &reservation)?;
                Submission { reservation, updated: false }
            }
        };

        tracing::info!(
            id = %submission.reservation.id,
            date = %submission.reservation.date,
            guests = submission.reservation.guests,
            updated = submission.updated,
            "Reservation submitted"
        );
        Ok(submission)
    }

    /// Replace the stored list with the admin panel's copy
    pub async fn save_all(&self, inputs: &[ReservationInput]) -> DomainResult<Vec<StatusChange>> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_initialized)?;

        match reconcile_reservations(conn, inputs) {
            Ok(changes) => {
                tracing::info!(
                    submitted = inputs.len(),
                    status_changes = changes.len(),
                    "Reservations saved"
                );
                Ok(changes)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Reservation save rolled back");
                Err(e)
            }
        }
    }
}

/// One transaction: update every known id, delete stored ids the payload
/// left out, ignore ids that are not stored.
///
/// Returns the reservations that moved to confirmed or rejected.
pub fn reconcile_reservations(conn: &mut Connection, inputs: &[ReservationInput]) -> DomainResult<Vec<StatusChange>> {
    let tx = conn.transaction()?;
    let mut changes = Vec::new();

    let stored: Vec<Reservation> = {
        let mut stmt = tx.prepare(&format!("SELECT {} FROM reservations", COLUMNS))?;
        let rows = stmt.query_map([], row_to_reservation)?;
        rows.collect::<Result<Vec<_>, _>>()?
    };

    let mut incoming: HashSet<String> = HashSet::new();
    for input in inputs {
        let Some(id) = input.id.as_deref().filter(|id| !id.trim().is_empty()) else {
            continue;
        };
        if !incoming.insert(id.to_string()) {
            return Err(DomainError::validation(format!("reservation {} appears more than once", id)));
        }
        let Some(existing) = stored.iter().find(|r| r.id == id) else {
            tracing::debug!(id, "Ignoring unknown reservation id");
            continue;
        };

        input.validate()?;
        let mut reservation = input.clone().into_reservation(existing.id.clone(), existing.created_at.clone())?;
        reservation.created_at = existing.created_at.clone();
        write_reservation(&tx, &reservation)?;

        let moved = reservation.status != existing.status
            && matches!(reservation.status, ReservationStatus::Confirmed | ReservationStatus::Rejected);
        if moved {
            changes.push(StatusChange {
                previous: existing.status,
                reservation,
            });
        }
    }

    for missing in stored.iter().filter(|r| !incoming.contains(&r.id)) {
        tx.execute("DELETE FROM reservations WHERE id = ?", params![missing.id])?;
        tracing::debug!(id = %missing.id, "Deleted reservation");
    }

    tx.commit()?;
    Ok(changes)
}

fn now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// "C" followed by six random digits, unused in storage
fn generate_id(conn: &Connection) -> DomainResult<String> {
    let mut rng = rand::thread_rng();
    for _ in 0..32 {
        let candidate = format!("C{:06}", rng.gen_range(0..1_000_000));
        if find_reservation(conn, &candidate)?.is_none() {
            return Ok(candidate);
        }
    }
    Err(DomainError::Internal("could not allocate a reservation id".to_string()))
}

fn find_reservation(conn: &Connection, id: &str) -> DomainResult<Option<Reservation>> {
    let found = conn
        .query_row(
            &format!("SELECT {} FROM reservations WHERE id = ?", COLUMNS),
            params![id],
            row_to_reservation,
        )
        .optional()?;
    Ok(found)
}

fn insert_reservation(conn: &Connection, r: &Reservation) -> DomainResult<()> {
    conn.execute(
        &format!("INSERT INTO reservations ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)", COLUMNS),
        params![
            r.id,
            r.name,
            r.email,
            r.phone,
            r.guests,
            r.date,
            r.time,
            r.comment,
            r.status.as_str(),
            r.rejection_reason,
            r.created_at
        ],
    )?;
    Ok(())
}

/// Overwrite everything but id and created_at; returns rows touched
fn write_reservation(conn: &Connection, r: &Reservation) -> DomainResult<usize> {
    let n = conn.execute(
        "UPDATE reservations SET name = ?, email = ?, phone = ?, guests = ?, date = ?, time = ?,
            comment = ?, status = ?, rejection_reason = ? WHERE id = ?",
        params![
            r.name,
            r.email,
            r.phone,
            r.guests,
            r.date,
            r.time,
            r.comment,
            r.status.as_str(),
            r.rejection_reason,
            r.id
        ],
    )?;
    Ok(n)
}

fn row_to_reservation(row: &rusqlite::Row) -> rusqlite::Result<Reservation> {
    let status: String = row.get(8)?;
    Ok(Reservation {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        guests: row.get(4)?,
        date: row.get(5)?,
        time: row.get(6)?,
        comment: row.get(7)?,
        status: ReservationStatus::from_str(&status),
        rejection_reason: row.get(9)?,
        created_at: row.get(10)?,
    })
}

#[async_trait]
impl Repository<Reservation> for ReservationRepository {
    /// Newest first
    async fn list(&self) -> DomainResult<Vec<Reservation>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM reservations ORDER BY created_at DESC, id",
            COLUMNS
        ))?;
        let reservations = stmt
            .query_map([], row_to_reservation)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reservations)
    }
}

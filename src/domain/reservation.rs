//! Reservation Entity
//!
//! Table reservations submitted from the public site and handled by staff.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use super::entity::{DomainError, DomainResult, Entity};

/// Reservation lifecycle as seen by the restaurant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    #[default]
    Pending,
    Confirmed,
    Rejected,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "confirmed" => ReservationStatus::Confirmed,
            "rejected" => ReservationStatus::Rejected,
            _ => ReservationStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    /// External id quoted to guests, e.g. "C042917"
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub guests: i32,
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM
    pub time: String,
    pub comment: String,
    pub status: ReservationStatus,
    pub rejection_reason: Option<String>,
    /// "YYYY-MM-DD HH:MM:SS"
    pub created_at: String,
}

impl Entity for Reservation {
    type Id = String;

    fn id(&self) -> Self::Id {
        self.id.clone()
    }
}

/// Reservation as submitted by the public form or the admin panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationInput {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub guests: i32,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub status: Option<ReservationStatus>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ReservationInput {
    /// Check required fields and normalize date/time formats
    pub fn validate(&self) -> DomainResult<()> {
        for (field, value) in [("name", &self.name), ("email", &self.email), ("phone", &self.phone)] {
            if value.trim().is_empty() {
                return Err(DomainError::validation(format!("{} is required", field)));
            }
        }
        if !self.email.contains('@') {
            return Err(DomainError::validation("email address is invalid"));
        }
        if self.guests < 1 {
            return Err(DomainError::validation("at least one guest is required"));
        }
        parse_date(&self.date)?;
        parse_time(&self.time)?;
        Ok(())
    }

    /// Turn the submission into a reservation row with the given id
    pub fn into_reservation(self, id: String, created_at: String) -> DomainResult<Reservation> {
        let time = parse_time(&self.time)?.format("%H:%M").to_string();
        Ok(Reservation {
            id,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            guests: self.guests,
            date: parse_date(&self.date)?.format("%Y-%m-%d").to_string(),
            time,
            comment: self.comment.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            rejection_reason: self.rejection_reason.filter(|r| !r.trim().is_empty()),
            created_at: self.created_at.unwrap_or(created_at),
        })
    }
}

pub fn parse_date(s: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::validation(format!("invalid date '{}', expected YYYY-MM-DD", s)))
}

/// Accepts HH:MM and HH:MM:SS
pub fn parse_time(s: &str) -> DomainResult<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| DomainError::validation(format!("invalid time '{}', expected HH:MM", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ReservationInput {
        ReservationInput {
            id: None,
            name: "Max Mustermann".to_string(),
            email: "max@example.com".to_string(),
            phone: "01761234567".to_string(),
            guests: 4,
            date: "2026-11-02".to_string(),
            time: "19:30".to_string(),
            comment: Some("Window seat please".to_string()),
            status: None,
            rejection_reason: None,
            created_at: None,
        }
    }

    #[test]
    fn test_valid_input() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_fields() {
        let mut bad = input();
        bad.guests = 0;
        assert!(bad.validate().is_err());

        let mut bad = input();
        bad.date = "02.11.2026".to_string();
        assert!(bad.validate().is_err());

        let mut bad = input();
        bad.name = "  ".to_string();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_time_is_normalized() {
        let mut with_seconds = input();
        with_seconds.time = "19:30:00".to_string();
        let res = with_seconds
            .into_reservation("C000001".to_string(), "2026-10-19 12:00:00".to_string())
            .unwrap();
        assert_eq!(res.time, "19:30");
        assert_eq!(res.status, ReservationStatus::Pending);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(ReservationStatus::Confirmed.as_str(), "confirmed");
        assert_eq!(ReservationStatus::from_str("rejected"), ReservationStatus::Rejected);
        assert_eq!(
            serde_json::to_string(&ReservationStatus::Pending).unwrap(),
            "\"pending\""
        );
    }
}

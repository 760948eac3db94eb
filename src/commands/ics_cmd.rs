//! Calendar Download Handler
//!
//! The ICS link in the confirmation mail points here.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;

use crate::domain::DomainError;
use crate::notify::calendar::event_uid;
use crate::notify::{ics_document, CalendarEvent};
use crate::AppState;
use super::response::ApiResult;

#[derive(Debug, Default, Deserialize)]
pub struct IcsQuery {
    date: Option<String>,
    time: Option<String>,
    name: Option<String>,
    guests: Option<String>,
    address: Option<String>,
}

/// Host part of a base URL, used as the UID domain
fn uid_domain(base_url: &str) -> &str {
    let rest = base_url.split_once("://").map(|(_, rest)| rest).unwrap_or(base_url);
    let host = rest.split(['/', ':']).next().unwrap_or_default();
    if host.is_empty() {
        "localhost"
    } else {
        host
    }
}

/// GET /api/ics?date=&time=&name=&guests=&address=
pub async fn download_ics(
    State(state): State<AppState>,
    Query(query): Query<IcsQuery>,
) -> ApiResult<Response> {
    let restaurant = state.notifier.restaurant();
    let (Some(date), Some(time)) = (query.date.as_deref(), query.time.as_deref()) else {
        return Err(DomainError::validation("date and time are required").into());
    };

    let address = query
        .address
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or(&restaurant.address);
    let event = CalendarEvent::new(
        &restaurant.name,
        query.name.as_deref().unwrap_or_default(),
        query.guests.as_deref().unwrap_or_default(),
        date,
        time,
        address,
    )?;

    let uid = event_uid(uid_domain(&restaurant.public_base_url));
    let body = ics_document(&event, Utc::now(), &uid);
    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"reservation.ics\""),
        ],
        body,
    )
        .into_response())
}

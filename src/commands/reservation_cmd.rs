//! Reservation Handlers
//!
//! Public booking form, the staff list and the staff bulk save. Mails go
//! out after storage has committed and never change the response status.

use axum::{body::Bytes, extract::State, response::Response, Json};
use serde_json::{json, Value};

use crate::auth::RequireStaff;
use crate::domain::{ReservationInput, ReservationStatus};
use crate::notify::TemplateKind;
use crate::repository::Repository;
use crate::AppState;
use super::response::{no_cache, parse_body, success, ApiResult};

/// GET /api/reservations (newest first)
pub async fn list_reservations(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
) -> ApiResult<Response> {
    let reservations = state.reservation_repo.list().await?;
    Ok(no_cache(Json(reservations)))
}

/// POST /api/reservations: booking request from the public site
pub async fn submit_reservation(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let input: ReservationInput = parse_body(&body)?;
    let submission = state.reservation_repo.submit(input).await?;

    let kind = if submission.updated {
        TemplateKind::AdminUpdated
    } else {
        TemplateKind::AdminNewRequest
    };
    let mailed = state.notifier.notify(kind, &submission.reservation).await;

    Ok(success(json!({ "id": submission.reservation.id, "mailed": mailed })))
}

/// PUT /api/reservations: the desk's full list replaces storage
pub async fn save_reservations(
    State(state): State<AppState>,
    RequireStaff(role): RequireStaff,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let inputs: Vec<ReservationInput> = parse_body(&body)?;
    let changes = state.reservation_repo.save_all(&inputs).await?;

    let mut mailed = 0;
    for change in &changes {
        let kind = match change.reservation.status {
            ReservationStatus::Confirmed => TemplateKind::CustomerConfirmed,
            ReservationStatus::Rejected => TemplateKind::CustomerRejected,
            ReservationStatus::Pending => continue,
        };
        if state.notifier.notify(kind, &change.reservation).await {
            mailed += 1;
        }
    }

    tracing::info!(role = role.as_str(), changes = changes.len(), mailed, "Reservation desk saved");
    Ok(success(json!({ "mailed": mailed })))
}

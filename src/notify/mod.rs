//! Notifications
//!
//! Reservation mails: templates, calendar invites and the transport seam.
//! Sending never fails the request that triggered it; failures are logged
//! and reported as `false`.

pub mod calendar;
mod templates;
mod transport;

use std::sync::Arc;

use crate::domain::{DomainResult, Reservation};

pub use calendar::{google_calendar_link, ics_document, ics_link, CalendarEvent};
pub use templates::{MailTemplates, RenderedMail, ReservationMail, TemplateKind};
pub use transport::{LogTransport, MailMessage, MailTransport, OutboxTransport};

/// Restaurant details that go into every mail
#[derive(Debug, Clone)]
pub struct RestaurantProfile {
    pub name: String,
    pub address: String,
    pub email: String,
    /// Base URL of this server as guests reach it, for ICS links
    pub public_base_url: String,
}

pub struct Notifier {
    templates: MailTemplates,
    transport: Arc<dyn MailTransport>,
    restaurant: RestaurantProfile,
}

impl Notifier {
    pub fn new(restaurant: RestaurantProfile, transport: Arc<dyn MailTransport>) -> DomainResult<Self> {
        Ok(Self {
            templates: MailTemplates::new()?,
            transport,
            restaurant,
        })
    }

    pub fn restaurant(&self) -> &RestaurantProfile {
        &self.restaurant
    }

    /// Render the mail without sending it
    pub fn compose(&self, kind: TemplateKind, reservation: &Reservation) -> DomainResult<MailMessage> {
        let mut mail = ReservationMail::new(&self.restaurant.name, reservation);
        if kind == TemplateKind::CustomerConfirmed {
            let event = CalendarEvent::for_reservation(reservation, &self.restaurant.name, &self.restaurant.address)?;
            mail.google_link = Some(google_calendar_link(&event));
            mail.ics_link = Some(ics_link(&self.restaurant.public_base_url, &event));
        }

        let rendered = self.templates.render(kind, &mail)?;
        let to = if kind.to_restaurant() {
            self.restaurant.email.clone()
        } else {
            reservation.email.clone()
        };
        Ok(MailMessage {
            kind,
            from: self.restaurant.email.clone(),
            to,
            subject: rendered.subject,
            html: rendered.html,
        })
    }

    /// Render and hand over to the transport; true when the transport accepted it
    pub async fn notify(&self, kind: TemplateKind, reservation: &Reservation) -> bool {
        let message = match self.compose(kind, reservation) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(kind = kind.name(), reservation = %reservation.id, error = %e, "Mail not rendered");
                return false;
            }
        };
        match self.transport.send(&message).await {
            Ok(()) => {
                tracing::info!(kind = kind.name(), reservation = %reservation.id, to = %message.to, "Mail sent");
                true
            }
            Err(e) => {
                tracing::error!(kind = kind.name(), reservation = %reservation.id, error = %e, "Mail not sent");
                false
            }
        }
    }
}

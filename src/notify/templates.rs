//! Mail Templates
//!
//! Handlebars templates for reservation mails, registered once in strict mode
//! so a missing field fails rendering instead of leaving a gap.

use handlebars::Handlebars;
use serde::Serialize;

use crate::domain::{DomainError, DomainResult, Reservation};

/// Which mail to send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// Restaurant: a guest sent a new request
    AdminNewRequest,
    /// Restaurant: a guest changed an existing request
    AdminUpdated,
    CustomerConfirmed,
    CustomerRejected,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 4] = [
        TemplateKind::AdminNewRequest,
        TemplateKind::AdminUpdated,
        TemplateKind::CustomerConfirmed,
        TemplateKind::CustomerRejected,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TemplateKind::AdminNewRequest => "admin_new_request",
            TemplateKind::AdminUpdated => "admin_updated",
            TemplateKind::CustomerConfirmed => "customer_confirmed",
            TemplateKind::CustomerRejected => "customer_rejected",
        }
    }

    /// Mails for the restaurant rather than the guest
    pub fn to_restaurant(&self) -> bool {
        matches!(self, TemplateKind::AdminNewRequest | TemplateKind::AdminUpdated)
    }

    /// Subjects are plain text, so values are not HTML escaped
    fn subject(&self) -> &'static str {
        match self {
            TemplateKind::AdminNewRequest => "New reservation request: {{{name}}} ({{date}})",
            TemplateKind::AdminUpdated => "Reservation updated: {{{name}}} ({{date}})",
            TemplateKind::CustomerConfirmed => "Your reservation at {{{restaurant}}} is confirmed",
            TemplateKind::CustomerRejected => "Your reservation request at {{{restaurant}}}",
        }
    }

    fn body(&self) -> &'static str {
        match self {
            TemplateKind::AdminNewRequest => ADMIN_NEW_REQUEST,
            TemplateKind::AdminUpdated => ADMIN_UPDATED,
            TemplateKind::CustomerConfirmed => CUSTOMER_CONFIRMED,
            TemplateKind::CustomerRejected => CUSTOMER_REJECTED,
        }
    }
}

const RESERVATION_DETAILS: &str = r#"<b>Guest:</b> {{name}}<br>
<b>Date:</b> {{date}} at {{time}}<br>
<b>Guests:</b> {{guests}}<br>
<b>Phone:</b> {{phone}}<br>
<b>Email:</b> {{email}}<br>
<b>Comment:</b> {{comment}}<br>"#;

const ADMIN_NEW_REQUEST: &str = r#"<h3>New reservation request!</h3>
{{> details}}
<b>ID:</b> {{id}}"#;

const ADMIN_UPDATED: &str = r#"<h3>A reservation was updated.</h3>
{{> details}}
<b>ID:</b> {{id}}<br>
<b>Status:</b> {{status}}"#;

const CUSTOMER_CONFIRMED: &str = r#"<p>Hello {{name}},</p>
<p>we are happy to confirm your table for {{guests}} on {{date}} at {{time}}.</p>
{{#if google_link}}<p><a href="{{{google_link}}}">Add to Google Calendar</a></p>{{/if}}
{{#if ics_link}}<p><a href="{{{ics_link}}}">Download calendar file (.ics)</a></p>{{/if}}
<p>See you soon,<br>{{restaurant}}</p>"#;

const CUSTOMER_REJECTED: &str = r#"<p>Hello {{name}},</p>
<p>unfortunately we cannot accept your reservation for {{date}} at {{time}}.</p>
{{#if rejection_reason}}<p><b>Reason:</b> {{rejection_reason}}</p>{{/if}}
<p>Kind regards,<br>{{restaurant}}</p>"#;

/// Everything a reservation template may reference
#[derive(Debug, Clone, Serialize)]
pub struct ReservationMail {
    pub restaurant: String,
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub guests: i32,
    pub date: String,
    pub time: String,
    pub comment: String,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub google_link: Option<String>,
    pub ics_link: Option<String>,
}

impl ReservationMail {
    pub fn new(restaurant: &str, reservation: &Reservation) -> Self {
        Self {
            restaurant: restaurant.to_string(),
            id: reservation.id.clone(),
            name: reservation.name.clone(),
            email: reservation.email.clone(),
            phone: reservation.phone.clone(),
            guests: reservation.guests,
            date: reservation.date.clone(),
            time: reservation.time.clone(),
            comment: reservation.comment.clone(),
            status: reservation.status.as_str().to_string(),
            rejection_reason: reservation.rejection_reason.clone(),
            google_link: None,
            ics_link: None,
        }
    }
}

/// Rendered subject and HTML body
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMail {
    pub subject: String,
    pub html: String,
}

pub struct MailTemplates {
    registry: Handlebars<'static>,
}

impl MailTemplates {
    pub fn new() -> DomainResult<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry
            .register_partial("details", RESERVATION_DETAILS)
            .map_err(|e| DomainError::Mail(format!("invalid partial: {}", e)))?;

        for kind in TemplateKind::ALL {
            registry
                .register_template_string(&format!("{}.subject", kind.name()), kind.subject())
                .map_err(|e| DomainError::Mail(format!("invalid subject for {}: {}", kind.name(), e)))?;
            registry
                .register_template_string(&format!("{}.body", kind.name()), kind.body())
                .map_err(|e| DomainError::Mail(format!("invalid body for {}: {}", kind.name(), e)))?;
        }
        Ok(Self { registry })
    }

    pub fn render(&self, kind: TemplateKind, mail: &ReservationMail) -> DomainResult<RenderedMail> {
        let render = |part: &str| {
            self.registry
                .render(&format!("{}.{}", kind.name(), part), mail)
                .map_err(|e| DomainError::Mail(format!("rendering {} {}: {}", kind.name(), part, e)))
        };
        Ok(RenderedMail {
            subject: render("subject")?,
            html: render("body")?,
        })
    }
}

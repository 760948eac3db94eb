//! Calendar Invites
//!
//! ICS files and Google Calendar links for confirmed reservations. Times are
//! restaurant local time (Central European Time, EU summer-time rules) and
//! are converted to UTC for both formats.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::domain::{parse_date, parse_time, DomainResult, Reservation};

/// A visit lasts this long in the calendar
pub const VISIT_HOURS: i64 = 2;

/// RFC 3986 unreserved characters stay as they are
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

const UTC_STAMP: &str = "%Y%m%dT%H%M%SZ";

/// One reservation as a calendar entry
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub restaurant: String,
    pub name: String,
    pub guests: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub address: String,
}

impl CalendarEvent {
    /// Parses date (YYYY-MM-DD) and time (HH:MM or HH:MM:SS)
    pub fn new(
        restaurant: &str,
        name: &str,
        guests: &str,
        date: &str,
        time: &str,
        address: &str,
    ) -> DomainResult<Self> {
        Ok(Self {
            restaurant: restaurant.to_string(),
            name: name.to_string(),
            guests: guests.to_string(),
            date: parse_date(date)?,
            time: parse_time(time)?,
            address: address.to_string(),
        })
    }

    pub fn for_reservation(reservation: &Reservation, restaurant: &str, address: &str) -> DomainResult<Self> {
        Self::new(
            restaurant,
            &reservation.name,
            &reservation.guests.to_string(),
            &reservation.date,
            &reservation.time,
            address,
        )
    }

    pub fn start_utc(&self) -> NaiveDateTime {
        local_to_utc(self.date.and_time(self.time))
    }

    pub fn end_utc(&self) -> NaiveDateTime {
        self.start_utc() + Duration::hours(VISIT_HOURS)
    }

    fn summary(&self) -> String {
        format!("Reservation {}", self.restaurant)
    }

    fn details(&self) -> String {
        format!(
            "Thank you for your reservation at {}!\n\nDetails:\nName: {}\nGuests: {}\n\nWe look forward to your visit!",
            self.restaurant, self.name, self.guests
        )
    }
}

fn last_sunday(year: i32, month: u32) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let mut day = first_of_next.pred_opt()?;
    while day.weekday() != Weekday::Sun {
        day = day.pred_opt()?;
    }
    Some(day)
}

/// CEST runs from 03:00 local on the last Sunday of March to 03:00 local on
/// the last Sunday of October. The repeated October hour counts as CEST.
/// Wall-clock times in the skipped March hour (02:00 to 02:59) do not exist
/// and are read as CET, which moves them one hour forward into CEST.
fn is_summer_time(local: NaiveDateTime) -> bool {
    let year = local.date().year();
    let (Some(march), Some(october)) = (last_sunday(year, 3), last_sunday(year, 10)) else {
        return false;
    };
    let begins = march.and_hms_opt(3, 0, 0);
    let ends = october.and_hms_opt(3, 0, 0);
    match (begins, ends) {
        (Some(begins), Some(ends)) => local >= begins && local < ends,
        _ => false,
    }
}

/// Restaurant local time to UTC
pub fn local_to_utc(local: NaiveDateTime) -> NaiveDateTime {
    let offset = if is_summer_time(local) { 2 } else { 1 };
    local - Duration::hours(offset)
}

/// Escape TEXT values per RFC 5545
fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

/// VCALENDAR document with a single VEVENT, CRLF line endings
pub fn ics_document(event: &CalendarEvent, stamp: DateTime<Utc>, uid: &str) -> String {
    let lines = [
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:-//{}//Reservation//EN", escape_text(&event.restaurant)),
        "CALSCALE:GREGORIAN".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("DTSTAMP:{}", stamp.format(UTC_STAMP)),
        format!("UID:{}", uid),
        format!("DTSTART:{}", event.start_utc().format(UTC_STAMP)),
        format!("DTEND:{}", event.end_utc().format(UTC_STAMP)),
        format!("SUMMARY:{}", escape_text(&event.summary())),
        format!("DESCRIPTION:{}", escape_text(&event.details())),
        format!("LOCATION:{}", escape_text(&event.address)),
        "END:VEVENT".to_string(),
        "END:VCALENDAR".to_string(),
    ];
    let mut doc = lines.join("\r\n");
    doc.push_str("\r\n");
    doc
}

/// Unique id for a VEVENT
pub fn event_uid(domain: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let hash = blake3::hash(&nanos.to_le_bytes());
    format!("res_{}@{}", &hash.to_hex().as_str()[..16], domain)
}

/// "Add to Google Calendar" template link
pub fn google_calendar_link(event: &CalendarEvent) -> String {
    format!(
        "https://calendar.google.com/calendar/render?action=TEMPLATE&text={}&dates={}/{}&details={}&location={}",
        encode(&event.summary()),
        event.start_utc().format("%Y%m%dT%H%M%SZ"),
        event.end_utc().format("%Y%m%dT%H%M%SZ"),
        encode(&event.details()),
        encode(&event.address),
    )
}

/// Link to the ICS download endpoint of this server
pub fn ics_link(public_base_url: &str, event: &CalendarEvent) -> String {
    format!(
        "{}/api/ics?date={}&time={}&name={}&guests={}&address={}",
        public_base_url.trim_end_matches('/'),
        event.date.format("%Y-%m-%d"),
        encode(&event.time.format("%H:%M").to_string()),
        encode(&event.name),
        encode(&event.guests),
        encode(&event.address),
    )
}

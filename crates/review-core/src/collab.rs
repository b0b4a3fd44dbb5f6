//! Narrow contracts for the external systems both jobs talk to.
//!
//! The jobs only see these traits; `jira` and `google` provide the HTTP
//! implementations, tests use in-memory fakes.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

/// Projection of a review ticket. People are carried as handles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub senior_reviewer: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approvers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points_of_contact: Vec<String>,
}

impl Ticket {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }
}

/// The searches the jobs need. The store resolves each to its own filter
/// language and field projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketQuery {
    NeedsSeniorReviewer,
    OpenForReviewer { handle: String },
    NeedsInPersonSlot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketField {
    SeniorReviewer,
    MeetingLink,
}

impl TicketField {
    /// Label used in update records.
    pub fn label(self) -> &'static str {
        match self {
            TicketField::SeniorReviewer => "SR_REVIEWER",
            TicketField::MeetingLink => "MEETING_LINK",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: TicketField,
    pub value: String,
}

pub trait TicketStore {
    /// Run a search, following pages until exhausted. Order is preserved.
    fn search(&self, query: &TicketQuery) -> Result<Vec<Ticket>>;

    fn update(&self, key: &str, changes: &[FieldChange]) -> Result<()>;

    /// Human-facing link to a ticket.
    fn browse_url(&self, key: &str) -> String;
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

pub trait Directory {
    /// Email addresses of `group` members holding `role`.
    fn list_group_members(&self, group: &str, role: &str) -> Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub html_link: String,
    /// Start instant as reported by the calendar (`dateTime` or `date`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub time_min: Option<DateTime<Utc>>,
    pub time_max: Option<DateTime<Utc>>,
    pub text: Option<String>,
    /// Page size; also the total cap when `limit` is set.
    pub max_results: Option<u32>,
    /// Stop after this many events instead of following every page.
    pub limit: Option<usize>,
    pub single_events: bool,
    pub order_by_start: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attendee {
    pub email: String,
}

/// Partial update; only the fields present are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<Attendee>>,
}

pub trait Calendar {
    fn list_events(&self, calendar_id: &str, query: &EventQuery) -> Result<Vec<CalendarEvent>>;

    fn patch_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<CalendarEvent>;
}

// ---------------------------------------------------------------------------
// Mail
// ---------------------------------------------------------------------------

pub trait Mailer {
    fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

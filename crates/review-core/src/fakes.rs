//! In-memory collaborators for job tests. Every call is recorded.

use crate::collab::{
    Calendar, CalendarEvent, Directory, EventPatch, EventQuery, FieldChange, Mailer, Ticket,
    TicketField, TicketQuery, TicketStore,
};
use crate::error::{Result, ReviewError};
use std::cell::RefCell;
use std::collections::HashMap;

fn unavailable(service: &str) -> ReviewError {
    ReviewError::Api {
        service: service.to_string(),
        status: 503,
        body: "unavailable".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeTickets {
    pub needs_reviewer: Vec<Ticket>,
    pub needs_slot: Vec<Ticket>,
    /// Open-ticket count per handle.
    pub open_counts: HashMap<String, usize>,
    pub fail_counts: bool,
    pub fail_updates: bool,
    pub updates: RefCell<Vec<(String, FieldChange)>>,
    pub searches: RefCell<Vec<TicketQuery>>,
}

impl FakeTickets {
    pub fn updated(&self) -> Vec<(String, TicketField, String)> {
        self.updates
            .borrow()
            .iter()
            .map(|(k, c)| (k.clone(), c.field, c.value.clone()))
            .collect()
    }
}

impl TicketStore for FakeTickets {
    fn search(&self, query: &TicketQuery) -> Result<Vec<Ticket>> {
        self.searches.borrow_mut().push(query.clone());
        match query {
            TicketQuery::NeedsSeniorReviewer => Ok(self.needs_reviewer.clone()),
            TicketQuery::NeedsInPersonSlot => Ok(self.needs_slot.clone()),
            TicketQuery::OpenForReviewer { handle } => {
                if self.fail_counts {
                    return Err(unavailable("jira"));
                }
                let n = self.open_counts.get(handle).copied().unwrap_or(0);
                Ok((0..n).map(|i| Ticket::new(format!("OPEN-{i}"))).collect())
            }
        }
    }

    fn update(&self, key: &str, changes: &[FieldChange]) -> Result<()> {
        if self.fail_updates {
            return Err(unavailable("jira"));
        }
        let mut updates = self.updates.borrow_mut();
        for change in changes {
            updates.push((key.to_string(), change.clone()));
        }
        Ok(())
    }

    fn browse_url(&self, key: &str) -> String {
        format!("https://tickets.test/browse/{key}")
    }
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeDirectory {
    pub members: Vec<String>,
    pub calls: RefCell<Vec<(String, String)>>,
}

impl Directory for FakeDirectory {
    fn list_group_members(&self, group: &str, role: &str) -> Result<Vec<String>> {
        self.calls
            .borrow_mut()
            .push((group.to_string(), role.to_string()));
        Ok(self.members.clone())
    }
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeCalendar {
    events: RefCell<HashMap<String, Vec<CalendarEvent>>>,
    queries: RefCell<Vec<(String, EventQuery)>>,
    patches: RefCell<Vec<(String, String, EventPatch)>>,
    pub fail_patches: bool,
}

impl FakeCalendar {
    pub fn set_events(&self, calendar_id: &str, events: Vec<CalendarEvent>) {
        self.events
            .borrow_mut()
            .insert(calendar_id.to_string(), events);
    }

    pub fn queries(&self) -> Vec<(String, EventQuery)> {
        self.queries.borrow().clone()
    }

    pub fn patches(&self) -> Vec<(String, String, EventPatch)> {
        self.patches.borrow().clone()
    }
}

impl Calendar for FakeCalendar {
    fn list_events(&self, calendar_id: &str, query: &EventQuery) -> Result<Vec<CalendarEvent>> {
        self.queries
            .borrow_mut()
            .push((calendar_id.to_string(), query.clone()));
        let mut events = self
            .events
            .borrow()
            .get(calendar_id)
            .cloned()
            .unwrap_or_default();
        if let Some(limit) = query.limit {
            events.truncate(limit);
        }
        Ok(events)
    }

    fn patch_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<CalendarEvent> {
        if self.fail_patches {
            return Err(unavailable("calendar"));
        }
        self.patches.borrow_mut().push((
            calendar_id.to_string(),
            event_id.to_string(),
            patch.clone(),
        ));
        let mut events = self.events.borrow_mut();
        let event = events
            .get_mut(calendar_id)
            .and_then(|evs| evs.iter_mut().find(|e| e.id == event_id))
            .ok_or_else(|| ReviewError::Api {
                service: "calendar".to_string(),
                status: 404,
                body: format!("event {event_id} not found"),
            })?;
        if let Some(description) = &patch.description {
            event.description = description.clone();
        }
        Ok(event.clone())
    }
}

// ---------------------------------------------------------------------------
// Mail
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct FakeMailer {
    pub sent: RefCell<Vec<SentEmail>>,
}

impl FakeMailer {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.borrow().clone()
    }
}

impl Mailer for FakeMailer {
    fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.sent.borrow_mut().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

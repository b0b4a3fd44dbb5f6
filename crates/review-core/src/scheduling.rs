//! In-person review scheduling run.
//!
//! Tickets waiting for an in-person review are matched, oldest first, to
//! upcoming review meetings whose description still carries the "not yet
//! assigned" sentinel. Each pairing updates the calendar first and the
//! ticket second: a ticket missing its meeting link is easier to spot and
//! repair than a meeting nobody knows about.

use crate::collab::{
    Attendee, Calendar, CalendarEvent, EventPatch, EventQuery, FieldChange, Mailer, Ticket,
    TicketField, TicketQuery, TicketStore,
};
use crate::config::Config;
use crate::error::{Result, ReviewError};
use crate::notify::{self, UpdateRecord, UpdateType};
use crate::reviewer::email_from_handle;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct Pairing {
    pub ticket: String,
    pub event_id: String,
    pub event_link: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulingReport {
    pub pairings: Vec<Pairing>,
    pub unused_slots: usize,
}

pub struct SchedulingJob<'a> {
    pub config: &'a Config,
    pub tickets: &'a dyn TicketStore,
    pub calendar: &'a dyn Calendar,
    pub mailer: &'a dyn Mailer,
}

impl SchedulingJob<'_> {
    /// Fails with `SchedulingCapacityExceeded` when tickets are left without a
    /// slot; the pairings that were made are still reported first.
    pub fn run(&self, now: DateTime<Utc>) -> Result<SchedulingReport> {
        let mut waiting: VecDeque<Ticket> = self
            .tickets
            .search(&TicketQuery::NeedsInPersonSlot)?
            .into();

        // Nothing to place, so skip the calendar round-trip.
        let mut slots: VecDeque<CalendarEvent> = if waiting.is_empty() {
            VecDeque::new()
        } else {
            self.open_slots(now)?.into()
        };
        info!(
            tickets = waiting.len(),
            open_slots = slots.len(),
            "starting in-person review scheduling"
        );

        let count = waiting.len().min(slots.len());
        let mut pairings = Vec::with_capacity(count);
        let mut updates = Vec::with_capacity(count);
        for (ticket, slot) in waiting.drain(..count).zip(slots.drain(..count)) {
            let pairing = self.bind(&ticket, &slot)?;
            updates.push(UpdateRecord {
                ticket: ticket.key.clone(),
                field: TicketField::MeetingLink.label().to_string(),
                new_value: pairing.event_link.clone(),
            });
            pairings.push(pairing);
        }

        notify::send_summary(
            self.mailer,
            &self.config.notifications,
            UpdateType::InPersonReviewScheduling,
            &updates,
        )?;

        if !waiting.is_empty() {
            let leftover: Vec<String> = waiting.into_iter().map(|t| t.key).collect();
            warn!(leftover = ?leftover, "ran out of in-person review slots");
            return Err(ReviewError::SchedulingCapacityExceeded { leftover });
        }

        Ok(SchedulingReport {
            pairings,
            unused_slots: slots.len(),
        })
    }

    /// Upcoming review meetings still carrying the sentinel, soonest first.
    fn open_slots(&self, now: DateTime<Utc>) -> Result<Vec<CalendarEvent>> {
        let scheduling = &self.config.scheduling;
        let query = EventQuery {
            time_min: Some(now),
            text: Some(scheduling.meeting_query.clone()),
            max_results: Some(scheduling.slots_ahead),
            limit: Some(scheduling.slots_ahead as usize),
            single_events: true,
            order_by_start: true,
            ..EventQuery::default()
        };
        let events = self.calendar.list_events(&scheduling.calendar_id, &query)?;
        Ok(events
            .into_iter()
            .filter(|e| e.description.contains(&scheduling.sentinel))
            .collect())
    }

    fn bind(&self, ticket: &Ticket, slot: &CalendarEvent) -> Result<Pairing> {
        let scheduling = &self.config.scheduling;
        let ticket_url = self.tickets.browse_url(&ticket.key);
        let patch = EventPatch {
            description: Some(assigned_description(
                &slot.description,
                &scheduling.sentinel,
                &ticket_url,
                ticket.summary.as_deref().unwrap_or(&ticket.key),
            )),
            attendees: Some(
                attendee_handles(ticket)
                    .into_iter()
                    .map(|h| Attendee {
                        email: email_from_handle(&h, &self.config.rotation.email_domain),
                    })
                    .collect(),
            ),
        };
        let updated = self
            .calendar
            .patch_event(&scheduling.calendar_id, &slot.id, &patch)?;

        let event_link = if updated.html_link.is_empty() {
            slot.html_link.clone()
        } else {
            updated.html_link
        };
        self.tickets.update(
            &ticket.key,
            &[FieldChange {
                field: TicketField::MeetingLink,
                value: event_link.clone(),
            }],
        )?;
        info!(ticket = %ticket.key, event = %slot.id, "scheduled in-person review");

        Ok(Pairing {
            ticket: ticket.key.clone(),
            event_id: slot.id.clone(),
            event_link,
        })
    }
}

/// Keep whatever precedes the sentinel and replace the rest with a link to
/// the ticket under review.
pub fn assigned_description(original: &str, sentinel: &str, url: &str, title: &str) -> String {
    let head = original.split(sentinel).next().unwrap_or_default().trim();
    let link = format!(
        r#"<a href="{}">{}</a>"#,
        escape_html(url),
        escape_html(title)
    );
    format!("{head}\n\n\nReview this week: [{link}]")
}

/// Assignee, reporter, senior reviewer, approvers and points of contact, in
/// that order, without repeats.
pub fn attendee_handles(ticket: &Ticket) -> Vec<String> {
    let mut seen = HashSet::new();
    [&ticket.assignee, &ticket.reporter, &ticket.senior_reviewer]
        .into_iter()
        .flatten()
        .chain(ticket.approvers.iter())
        .chain(ticket.points_of_contact.iter())
        .filter(|h| seen.insert(h.as_str()))
        .cloned()
        .collect()
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

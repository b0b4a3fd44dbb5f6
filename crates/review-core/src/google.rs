//! Directory, Calendar and Gmail collaborators on Google's REST APIs.
//!
//! One bearer token covers all three services; obtaining it (service
//! account delegation, etc.) happens outside this process.

use crate::collab::{Calendar, CalendarEvent, Directory, EventPatch, EventQuery, Mailer};
use crate::config::GoogleConfig;
use crate::error::Result;
use crate::http;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MembersPage {
    #[serde(default)]
    members: Vec<Member>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Member {
    email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsPage {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    html_link: Option<String>,
    #[serde(default)]
    start: Option<EventTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    date_time: Option<String>,
    date: Option<String>,
}

impl From<ApiEvent> for CalendarEvent {
    fn from(e: ApiEvent) -> Self {
        CalendarEvent {
            id: e.id,
            description: e.description.unwrap_or_default(),
            html_link: e.html_link.unwrap_or_default(),
            start: e.start.and_then(|s| s.date_time.or(s.date)),
        }
    }
}

pub struct GoogleClient {
    http: Client,
    config: GoogleConfig,
    token: String,
}

impl GoogleClient {
    pub fn new(config: &GoogleConfig, token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: http::client()?,
            config: config.clone(),
            token: token.into(),
        })
    }

    pub fn from_env(config: &GoogleConfig) -> Result<Self> {
        let token = http::token_from_env(&config.token_env)?;
        Self::new(config, token)
    }
}

impl Directory for GoogleClient {
    fn list_group_members(&self, group: &str, role: &str) -> Result<Vec<String>> {
        let url = http::endpoint(&self.config.directory_url, &["groups", group, "members"])?;
        let mut emails = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut req = self
                .http
                .get(url.clone())
                .bearer_auth(&self.token)
                .query(&[("roles", role)]);
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token)]);
            }
            let page: MembersPage = http::check("directory", req.send()?)?.json()?;
            emails.extend(page.members.into_iter().map(|m| m.email));
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(emails)
    }
}

impl Calendar for GoogleClient {
    fn list_events(&self, calendar_id: &str, query: &EventQuery) -> Result<Vec<CalendarEvent>> {
        let url = http::endpoint(&self.config.calendar_url, &["calendars", calendar_id, "events"])?;

        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(t) = query.time_min {
            params.push(("timeMin", t.format(DATE_FORMAT).to_string()));
        }
        if let Some(t) = query.time_max {
            params.push(("timeMax", t.format(DATE_FORMAT).to_string()));
        }
        if let Some(q) = &query.text {
            params.push(("q", q.clone()));
        }
        if let Some(n) = query.max_results {
            params.push(("maxResults", n.to_string()));
        }
        if query.single_events {
            params.push(("singleEvents", "true".to_string()));
        }
        if query.order_by_start {
            params.push(("orderBy", "startTime".to_string()));
        }

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut req = self
                .http
                .get(url.clone())
                .bearer_auth(&self.token)
                .query(&params);
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token)]);
            }
            let page: EventsPage = http::check("calendar", req.send()?)?.json()?;
            debug!(calendar = calendar_id, fetched = page.items.len(), "calendar events page");
            events.extend(page.items.into_iter().map(CalendarEvent::from));

            if let Some(limit) = query.limit {
                if events.len() >= limit {
                    events.truncate(limit);
                    break;
                }
            }
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(events)
    }

    /// PATCH rather than PUT so only the listed fields can change.
    fn patch_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<CalendarEvent> {
        let url = http::endpoint(
            &self.config.calendar_url,
            &["calendars", calendar_id, "events", event_id],
        )?;
        let resp = self
            .http
            .patch(url)
            .bearer_auth(&self.token)
            .json(patch)
            .send()?;
        let event: ApiEvent = http::check("calendar", resp)?.json()?;
        Ok(event.into())
    }
}

/// Plain-text RFC 822 message, base64url encoded as Gmail expects.
pub fn raw_message(to: &str, subject: &str, body: &str) -> String {
    let message = format!(
        "To: {to}\r\nSubject: {subject}\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\n\r\n{body}"
    );
    URL_SAFE.encode(message.as_bytes())
}

impl Mailer for GoogleClient {
    fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let url = http::endpoint(&self.config.gmail_url, &["users", "me", "messages", "send"])?;
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&json!({ "raw": raw_message(to, subject, body) }))
            .send()?;
        http::check("gmail", resp)?;
        Ok(())
    }
}

//! Ticket store backed by the Jira REST API (v2).
//!
//! Semantic fields and searches are resolved to custom-field ids and JQL
//! once, from [`JiraConfig`], when the client is built.

use crate::collab::{FieldChange, Ticket, TicketField, TicketQuery, TicketStore};
use crate::config::JiraConfig;
use crate::error::Result;
use crate::http;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

const SERVICE: &str = "jira";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPage {
    #[serde(default)]
    total: usize,
    #[serde(default)]
    issues: Vec<Issue>,
}

#[derive(Debug, Deserialize)]
struct Issue {
    key: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

pub struct JiraClient {
    http: Client,
    config: JiraConfig,
    token: String,
}

impl JiraClient {
    pub fn new(config: &JiraConfig, token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: http::client()?,
            config: config.clone(),
            token: token.into(),
        })
    }

    /// Build with the token named by `config.token_env`.
    pub fn from_env(config: &JiraConfig) -> Result<Self> {
        let token = http::token_from_env(&config.token_env)?;
        Self::new(config, token)
    }

    fn jql(&self, query: &TicketQuery) -> String {
        let queries = &self.config.queries;
        match query {
            TicketQuery::NeedsSeniorReviewer => queries.needs_senior_reviewer.clone(),
            TicketQuery::OpenForReviewer { handle } => {
                queries.open_for_reviewer.replace("{handle}", handle)
            }
            TicketQuery::NeedsInPersonSlot => queries.needs_in_person_slot.clone(),
        }
    }

    /// Only pull back the fields the caller needs.
    fn projection(&self, query: &TicketQuery) -> Vec<&str> {
        let fields = &self.config.fields;
        match query {
            TicketQuery::NeedsSeniorReviewer => vec![fields.senior_reviewer.as_str()],
            TicketQuery::OpenForReviewer { .. } => vec!["id"],
            TicketQuery::NeedsInPersonSlot => vec![
                "summary",
                "assignee",
                "reporter",
                fields.senior_reviewer.as_str(),
                fields.approvers.as_str(),
                fields.points_of_contact.as_str(),
            ],
        }
    }

    fn field_id(&self, field: TicketField) -> &str {
        match field {
            TicketField::SeniorReviewer => &self.config.fields.senior_reviewer,
            TicketField::MeetingLink => &self.config.fields.meeting_link,
        }
    }

    fn field_value(field: TicketField, value: &str) -> Value {
        match field {
            TicketField::SeniorReviewer => json!({ "name": value }),
            TicketField::MeetingLink => Value::String(value.to_string()),
        }
    }

    fn to_ticket(&self, issue: Issue) -> Ticket {
        let fields = &self.config.fields;
        let f = &issue.fields;
        Ticket {
            summary: f.get("summary").and_then(Value::as_str).map(str::to_string),
            assignee: user_name(f.get("assignee")),
            reporter: user_name(f.get("reporter")),
            senior_reviewer: user_name(f.get(&fields.senior_reviewer)),
            approvers: user_names(f.get(&fields.approvers)),
            points_of_contact: user_names(f.get(&fields.points_of_contact)),
            key: issue.key,
        }
    }
}

fn user_name(v: Option<&Value>) -> Option<String> {
    v?.get("name")?.as_str().map(str::to_string)
}

fn user_names(v: Option<&Value>) -> Vec<String> {
    v.and_then(Value::as_array)
        .map(|users| users.iter().filter_map(|u| user_name(Some(u))).collect())
        .unwrap_or_default()
}

impl TicketStore for JiraClient {
    fn search(&self, query: &TicketQuery) -> Result<Vec<Ticket>> {
        let url = http::endpoint(&self.config.base_url, &["rest", "api", "2", "search"])?;
        let jql = self.jql(query);
        let fields = self.projection(query).join(",");

        let mut tickets = Vec::new();
        let mut start_at = 0usize;
        loop {
            let resp = self
                .http
                .get(url.clone())
                .bearer_auth(&self.token)
                .query(&[
                    ("jql", jql.clone()),
                    ("fields", fields.clone()),
                    ("startAt", start_at.to_string()),
                    ("maxResults", self.config.page_size.to_string()),
                ])
                .send()?;
            let page: SearchPage = http::check(SERVICE, resp)?.json()?;
            let fetched = page.issues.len();
            debug!(start_at, fetched, total = page.total, "jira search page");
            tickets.extend(page.issues.into_iter().map(|i| self.to_ticket(i)));
            start_at += fetched;
            if fetched == 0 || start_at >= page.total {
                break;
            }
        }
        Ok(tickets)
    }

    fn update(&self, key: &str, changes: &[FieldChange]) -> Result<()> {
        let url = http::endpoint(&self.config.base_url, &["rest", "api", "2", "issue", key])?;
        let fields: Map<String, Value> = changes
            .iter()
            .map(|c| {
                (
                    self.field_id(c.field).to_string(),
                    Self::field_value(c.field, &c.value),
                )
            })
            .collect();
        let resp = self
            .http
            .put(url)
            .bearer_auth(&self.token)
            .json(&json!({ "fields": fields }))
            .send()?;
        http::check(SERVICE, resp)?;
        Ok(())
    }

    fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{key}", self.config.base_url.trim_end_matches('/'))
    }
}

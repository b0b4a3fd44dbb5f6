use crate::collab::Mailer;
use crate::config::NotificationConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    SeniorReviewerAssignment,
    InPersonReviewScheduling,
}

impl std::fmt::Display for UpdateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateType::SeniorReviewerAssignment => f.write_str("SENIOR REVIEWER ASSIGNMENT"),
            UpdateType::InPersonReviewScheduling => f.write_str("IN PERSON REVIEW SCHEDULING"),
        }
    }
}

/// One side effect written to the ticket store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRecord {
    pub ticket: String,
    pub field: String,
    pub new_value: String,
}

pub fn summary_subject(config: &NotificationConfig, kind: UpdateType) -> String {
    format!("{} Updates: {kind}", config.subject_prefix)
}

pub fn summary_body(updates: &[UpdateRecord]) -> Result<String> {
    if updates.is_empty() {
        return Ok("No updates were made.".to_string());
    }
    let lines = updates
        .iter()
        .map(serde_json::to_string)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(format!(
        "The following updates have been made:\n\t{}",
        lines.join("\n\t")
    ))
}

pub fn send_summary(
    mailer: &dyn Mailer,
    config: &NotificationConfig,
    kind: UpdateType,
    updates: &[UpdateRecord],
) -> Result<()> {
    let body = summary_body(updates)?;
    mailer.send_email(&config.summary_to, &summary_subject(config, kind), &body)
}

pub fn escalation_subject(kind: UpdateType) -> String {
    format!("Exception while making updates: {kind}")
}

pub fn escalation_body(error: &str, trace: &str) -> String {
    format!("{error}\n\nStacktrace:\n{trace}")
}

/// Page a human about a failed run.
pub fn send_escalation(
    mailer: &dyn Mailer,
    config: &NotificationConfig,
    kind: UpdateType,
    error: &str,
    trace: &str,
) -> Result<()> {
    mailer.send_email(
        &config.escalation_to,
        &escalation_subject(kind),
        &escalation_body(error, trace),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeMailer;

    fn record(ticket: &str, value: &str) -> UpdateRecord {
        UpdateRecord {
            ticket: ticket.to_string(),
            field: "SR_REVIEWER".to_string(),
            new_value: value.to_string(),
        }
    }

    #[test]
    fn summary_lists_each_update_as_json() {
        let body = summary_body(&[record("DR-1", "ada"), record("DR-2", "grace")]).unwrap();
        assert!(body.starts_with("The following updates have been made:"));
        assert!(body.contains(r#"{"ticket":"DR-1","field":"SR_REVIEWER","new_value":"ada"}"#));
        assert_eq!(body.matches("\n\t").count(), 2);
    }

    #[test]
    fn empty_summary_says_so() {
        assert_eq!(summary_body(&[]).unwrap(), "No updates were made.");
    }

    #[test]
    fn summary_goes_to_admins() {
        let mailer = FakeMailer::default();
        let cfg = NotificationConfig::default();
        send_summary(
            &mailer,
            &cfg,
            UpdateType::SeniorReviewerAssignment,
            &[record("DR-1", "ada")],
        )
        .unwrap();
        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, cfg.summary_to);
        assert_eq!(
            sent[0].subject,
            "Design Review Cron Updates: SENIOR REVIEWER ASSIGNMENT"
        );
    }

    #[test]
    fn escalation_carries_error_and_trace() {
        let mailer = FakeMailer::default();
        let cfg = NotificationConfig::default();
        send_escalation(
            &mailer,
            &cfg,
            UpdateType::InPersonReviewScheduling,
            "no available senior reviewers",
            "at assign",
        )
        .unwrap();
        let sent = mailer.sent();
        assert_eq!(sent[0].to, cfg.escalation_to);
        assert_eq!(
            sent[0].subject,
            "Exception while making updates: IN PERSON REVIEW SCHEDULING"
        );
        assert_eq!(
            sent[0].body,
            "no available senior reviewers\n\nStacktrace:\nat assign"
        );
    }
}

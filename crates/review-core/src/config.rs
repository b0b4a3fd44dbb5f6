use crate::error::{Result, ReviewError};
use crate::paths;
use crate::reviewer::is_valid_email;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// JiraConfig
// ---------------------------------------------------------------------------

/// Maps semantic ticket fields to the store's custom-field identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JiraFieldMap {
    #[serde(default = "default_senior_reviewer_field")]
    pub senior_reviewer: String,
    #[serde(default = "default_meeting_link_field")]
    pub meeting_link: String,
    #[serde(default = "default_approvers_field")]
    pub approvers: String,
    #[serde(default = "default_points_of_contact_field")]
    pub points_of_contact: String,
}

fn default_senior_reviewer_field() -> String {
    "customfield_18441".to_string()
}

fn default_meeting_link_field() -> String {
    "customfield_18402".to_string()
}

fn default_approvers_field() -> String {
    "customfield_16501".to_string()
}

fn default_points_of_contact_field() -> String {
    "customfield_16532".to_string()
}

impl Default for JiraFieldMap {
    fn default() -> Self {
        Self {
            senior_reviewer: default_senior_reviewer_field(),
            meeting_link: default_meeting_link_field(),
            approvers: default_approvers_field(),
            points_of_contact: default_points_of_contact_field(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JiraQueries {
    #[serde(default = "default_needs_senior_reviewer")]
    pub needs_senior_reviewer: String,
    /// `{handle}` is replaced with the reviewer's handle.
    #[serde(default = "default_open_for_reviewer")]
    pub open_for_reviewer: String,
    /// Must be ordered by creation date; slots are handed out in this order.
    #[serde(default = "default_needs_in_person_slot")]
    pub needs_in_person_slot: String,
}

fn default_needs_senior_reviewer() -> String {
    r#"project = "Design Review" AND status = "In Review" AND "Senior Reviewer" = EMPTY"#
        .to_string()
}

fn default_open_for_reviewer() -> String {
    r#"project = "Design Review" AND "Senior Reviewer" = {handle} AND status = "In Review""#
        .to_string()
}

fn default_needs_in_person_slot() -> String {
    concat!(
        r#"project = "Design Review" AND labels = "In-Person-Design-Review-Requested" "#,
        r#"AND "Google Calendar Meeting" is EMPTY "#,
        r#"AND status in ("In Review", "In Progress") ORDER BY created ASC"#
    )
    .to_string()
}

impl Default for JiraQueries {
    fn default() -> Self {
        Self {
            needs_senior_reviewer: default_needs_senior_reviewer(),
            open_for_reviewer: default_open_for_reviewer(),
            needs_in_person_slot: default_needs_in_person_slot(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraConfig {
    #[serde(default = "default_jira_url")]
    pub base_url: String,
    #[serde(default = "default_jira_token_env")]
    pub token_env: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub fields: JiraFieldMap,
    #[serde(default)]
    pub queries: JiraQueries,
}

fn default_jira_url() -> String {
    "https://jira.example.com".to_string()
}

fn default_jira_token_env() -> String {
    "REVIEW_BOT_JIRA_TOKEN".to_string()
}

fn default_page_size() -> u32 {
    100
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: default_jira_url(),
            token_env: default_jira_token_env(),
            page_size: default_page_size(),
            fields: JiraFieldMap::default(),
            queries: JiraQueries::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// GoogleConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    #[serde(default = "default_directory_url")]
    pub directory_url: String,
    #[serde(default = "default_calendar_url")]
    pub calendar_url: String,
    #[serde(default = "default_gmail_url")]
    pub gmail_url: String,
    #[serde(default = "default_google_token_env")]
    pub token_env: String,
}

fn default_directory_url() -> String {
    "https://admin.googleapis.com/admin/directory/v1".to_string()
}

fn default_calendar_url() -> String {
    "https://www.googleapis.com/calendar/v3".to_string()
}

fn default_gmail_url() -> String {
    "https://gmail.googleapis.com/gmail/v1".to_string()
}

fn default_google_token_env() -> String {
    "REVIEW_BOT_GOOGLE_TOKEN".to_string()
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            directory_url: default_directory_url(),
            calendar_url: default_calendar_url(),
            gmail_url: default_gmail_url(),
            token_env: default_google_token_env(),
        }
    }
}

// ---------------------------------------------------------------------------
// RotationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Directory group whose members form the reviewer pool.
    #[serde(default = "default_group")]
    pub group: String,
    /// Group role that marks senior reviewers (owners are admins).
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "default_email_domain")]
    pub email_domain: String,
    #[serde(default = "default_review_sla_days")]
    pub review_sla_days: u32,
    #[serde(default = "default_min_days_available")]
    pub min_days_available: u32,
    #[serde(default = "default_ooo_query")]
    pub ooo_query: String,
    /// Non-working days in addition to weekends.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holidays: Vec<NaiveDate>,
    /// Static pool used instead of the directory group when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pool_override: Vec<String>,
}

fn default_group() -> String {
    "senior-design-review@example.com".to_string()
}

fn default_role() -> String {
    "MANAGER".to_string()
}

fn default_email_domain() -> String {
    "example.com".to_string()
}

fn default_review_sla_days() -> u32 {
    7
}

fn default_min_days_available() -> u32 {
    4
}

fn default_ooo_query() -> String {
    "Out of office".to_string()
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            group: default_group(),
            role: default_role(),
            email_domain: default_email_domain(),
            review_sla_days: default_review_sla_days(),
            min_days_available: default_min_days_available(),
            ooo_query: default_ooo_query(),
            holidays: Vec::new(),
            pool_override: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// SchedulingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingConfig {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    #[serde(default = "default_meeting_query")]
    pub meeting_query: String,
    /// Placeholder text marking a slot as unassigned.
    #[serde(default = "default_sentinel")]
    pub sentinel: String,
    /// Number of upcoming review meetings to consider per run.
    #[serde(default = "default_slots_ahead")]
    pub slots_ahead: u32,
}

fn default_calendar_id() -> String {
    "design-review@example.com".to_string()
}

fn default_meeting_query() -> String {
    "in person design review".to_string()
}

fn default_sentinel() -> String {
    "Review this week: [Not Yet Assigned]".to_string()
}

fn default_slots_ahead() -> u32 {
    4
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            calendar_id: default_calendar_id(),
            meeting_query: default_meeting_query(),
            sentinel: default_sentinel(),
            slots_ahead: default_slots_ahead(),
        }
    }
}

// ---------------------------------------------------------------------------
// NotificationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_summary_to")]
    pub summary_to: String,
    #[serde(default = "default_escalation_to")]
    pub escalation_to: String,
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

fn default_summary_to() -> String {
    "design-review-admin@example.com".to_string()
}

fn default_escalation_to() -> String {
    "design-review-oncall@example.com".to_string()
}

fn default_subject_prefix() -> String {
    "Design Review Cron".to_string()
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            summary_to: default_summary_to(),
            escalation_to: default_escalation_to(),
            subject_prefix: default_subject_prefix(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub jira: JiraConfig,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub rotation: RotationConfig,
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            jira: JiraConfig::default(),
            google: GoogleConfig::default(),
            rotation: RotationConfig::default(),
            scheduling: SchedulingConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(ReviewError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Load and refuse to continue if validation reports any errors.
    pub fn load_valid(root: &Path) -> Result<Self> {
        let cfg = Self::load(root)?;
        let errors: Vec<String> = cfg
            .validate()
            .into_iter()
            .filter(|w| w.level == WarnLevel::Error)
            .map(|w| w.message)
            .collect();
        if !errors.is_empty() {
            return Err(ReviewError::InvalidConfig(errors.join("; ")));
        }
        Ok(cfg)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut error = |message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message,
            })
        };

        for (name, url) in [
            ("jira.base_url", &self.jira.base_url),
            ("google.directory_url", &self.google.directory_url),
            ("google.calendar_url", &self.google.calendar_url),
            ("google.gmail_url", &self.google.gmail_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                error(format!("{name} must be an http(s) URL, got '{url}'"));
            }
        }

        for (name, addr) in [
            ("rotation.group", &self.rotation.group),
            ("notifications.summary_to", &self.notifications.summary_to),
            ("notifications.escalation_to", &self.notifications.escalation_to),
        ] {
            if !is_valid_email(addr) {
                error(format!("{name} is not an email address: '{addr}'"));
            }
        }

        for addr in &self.rotation.pool_override {
            if !is_valid_email(addr) {
                error(format!(
                    "rotation.pool_override entry is not an email address: '{addr}'"
                ));
            }
        }

        if !self.jira.queries.open_for_reviewer.contains("{handle}") {
            error("jira.queries.open_for_reviewer must contain '{handle}'".to_string());
        }

        if self.jira.page_size == 0 {
            error("jira.page_size must be greater than zero".to_string());
        }

        if self.scheduling.sentinel.trim().is_empty() {
            error("scheduling.sentinel must not be empty".to_string());
        }

        if self.rotation.min_days_available > self.rotation.review_sla_days {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "rotation.min_days_available ({}) exceeds review_sla_days ({}); \
                     every reviewer will be treated as unavailable",
                    self.rotation.min_days_available, self.rotation.review_sla_days
                ),
            });
        }

        if self.scheduling.slots_ahead == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "scheduling.slots_ahead is 0; no meetings will ever be filled"
                    .to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use anyhow::Context;
use review_core::config::Config;
use review_core::google::GoogleClient;
use review_core::jira::JiraClient;

/// Google handles directory, calendar and mail; it is built first so a
/// failure anywhere after it can still be escalated by email.
pub fn google(config: &Config) -> anyhow::Result<GoogleClient> {
    GoogleClient::from_env(&config.google).context("failed to build Google client")
}

pub fn jira(config: &Config) -> anyhow::Result<JiraClient> {
    JiraClient::from_env(&config.jira).context("failed to build Jira client")
}

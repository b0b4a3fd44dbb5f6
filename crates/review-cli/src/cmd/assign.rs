use crate::{clients, escalate, output::print_json, output::print_table};
use anyhow::Context;
use chrono::Utc;
use review_core::assignment::{AssignmentJob, AssignmentReport};
use review_core::config::Config;
use review_core::google::GoogleClient;
use review_core::notify::UpdateType;
use review_core::store::FileRotationStore;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load_valid(root).context("failed to load config")?;
    let google = clients::google(&config)?;

    let result = execute(root, &config, &google);
    let report = escalate::on_failure(
        &google,
        &config.notifications,
        UpdateType::SeniorReviewerAssignment,
        result,
    )?;

    if json {
        return print_json(&report);
    }

    if report.updates.is_empty() {
        println!("No tickets waiting for a senior reviewer.");
    } else {
        let rows = report
            .updates
            .iter()
            .map(|u| vec![u.ticket.clone(), u.field.clone(), u.new_value.clone()])
            .collect();
        print_table(&["TICKET", "FIELD", "VALUE"], rows);
    }
    if !report.skipped.is_empty() {
        println!();
        println!("Skipped (unavailable): {}", report.skipped.join(", "));
    }
    Ok(())
}

fn execute(root: &Path, config: &Config, google: &GoogleClient) -> anyhow::Result<AssignmentReport> {
    let jira = clients::jira(config)?;
    let store = FileRotationStore::for_root(root);
    let job = AssignmentJob {
        config,
        tickets: &jira,
        directory: google,
        calendar: google,
        mailer: google,
        store: &store,
    };
    job.run(Utc::now().date_naive())
        .context("senior reviewer assignment failed")
}

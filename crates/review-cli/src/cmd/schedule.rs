use crate::{clients, escalate, output::print_json, output::print_table};
use anyhow::Context;
use chrono::Utc;
use review_core::config::Config;
use review_core::notify::UpdateType;
use review_core::google::GoogleClient;
use review_core::scheduling::{SchedulingJob, SchedulingReport};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load_valid(root).context("failed to load config")?;
    let google = clients::google(&config)?;

    let result = execute(&config, &google);
    let report = escalate::on_failure(
        &google,
        &config.notifications,
        UpdateType::InPersonReviewScheduling,
        result,
    )?;

    if json {
        return print_json(&report);
    }

    if report.pairings.is_empty() {
        println!("No tickets waiting for an in-person review slot.");
    } else {
        let rows = report
            .pairings
            .iter()
            .map(|p| vec![p.ticket.clone(), p.event_id.clone(), p.event_link.clone()])
            .collect();
        print_table(&["TICKET", "EVENT", "LINK"], rows);
    }
    println!();
    println!("Open slots left: {}", report.unused_slots);
    Ok(())
}

fn execute(config: &Config, google: &GoogleClient) -> anyhow::Result<SchedulingReport> {
    let jira = clients::jira(config)?;
    let job = SchedulingJob {
        config,
        tickets: &jira,
        calendar: google,
        mailer: google,
    };
    job.run(Utc::now())
        .context("in-person review scheduling failed")
}

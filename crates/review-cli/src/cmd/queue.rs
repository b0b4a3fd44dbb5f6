use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use review_core::store::{FileRotationStore, RotationStore};
use std::path::Path;

#[derive(Subcommand)]
pub enum QueueSubcommand {
    /// Print the persisted rotation order, next reviewer first
    Show,

    /// Delete the persisted order; the next run falls back to open-ticket ranking
    Reset,
}

pub fn run(root: &Path, subcmd: QueueSubcommand, json: bool) -> anyhow::Result<()> {
    let store = FileRotationStore::for_root(root);
    match subcmd {
        QueueSubcommand::Show => show(&store, json),
        QueueSubcommand::Reset => reset(&store, json),
    }
}

fn show(store: &FileRotationStore, json: bool) -> anyhow::Result<()> {
    if !store.path().exists() {
        if json {
            return print_json(&serde_json::json!({ "order": [], "updated_at": null }));
        }
        println!("No persisted rotation order; the next run will rank reviewers by open tickets.");
        return Ok(());
    }

    let state = store
        .load_state()
        .context("rotation.yaml cannot be read; run 'review-bot queue reset'")?;

    if json {
        return print_json(&state);
    }

    let rows = state
        .order
        .iter()
        .enumerate()
        .map(|(i, email)| vec![(i + 1).to_string(), email.clone()])
        .collect();
    print_table(&["#", "REVIEWER"], rows);
    println!();
    println!("Updated: {}", state.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    Ok(())
}

fn reset(store: &FileRotationStore, json: bool) -> anyhow::Result<()> {
    let removed = store.clear().context("failed to remove rotation.yaml")?;
    if json {
        return print_json(&serde_json::json!({ "removed": removed }));
    }
    if removed {
        println!("Rotation order cleared.");
    } else {
        println!("No persisted rotation order to clear.");
    }
    Ok(())
}

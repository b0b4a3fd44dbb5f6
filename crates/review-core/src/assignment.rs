//! Senior reviewer assignment run.

use crate::availability;
use crate::collab::{Calendar, Directory, FieldChange, Mailer, TicketField, TicketQuery, TicketStore};
use crate::config::Config;
use crate::error::Result;
use crate::notify::{self, UpdateRecord, UpdateType};
use crate::reviewer::handle_from_email;
use crate::rotation::{OpenTicketRanking, PersistedOrder, RotationQueue};
use crate::store::RotationStore;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentReport {
    pub updates: Vec<UpdateRecord>,
    /// Reviewers passed over this run because they were unavailable.
    pub skipped: Vec<String>,
    /// Order saved for the next run.
    pub persisted_order: Vec<String>,
}

pub struct AssignmentJob<'a> {
    pub config: &'a Config,
    pub tickets: &'a dyn TicketStore,
    pub directory: &'a dyn Directory,
    pub calendar: &'a dyn Calendar,
    pub mailer: &'a dyn Mailer,
    pub store: &'a dyn RotationStore,
}

impl AssignmentJob<'_> {
    /// Assign one reviewer per waiting ticket, persist the rotation and mail
    /// a summary. Any error aborts the run before state is saved.
    pub fn run(&self, today: NaiveDate) -> Result<AssignmentReport> {
        let rotation = &self.config.rotation;

        let to_assign = self.tickets.search(&TicketQuery::NeedsSeniorReviewer)?;
        let pool = self.pool()?;
        let availability = availability::availability_map(self.calendar, &pool, today, rotation)?;
        info!(
            tickets = to_assign.len(),
            pool = pool.len(),
            available = availability.values().filter(|a| **a).count(),
            "starting senior reviewer assignment"
        );

        let persisted = PersistedOrder::new(self.store);
        let ranking = OpenTicketRanking::new(|email: &str| {
            let handle = handle_from_email(email, &rotation.email_domain);
            Ok(self
                .tickets
                .search(&TicketQuery::OpenForReviewer { handle })?
                .len())
        });
        let mut queue = RotationQueue::from_sources(
            &pool,
            &availability,
            &[&persisted, &ranking],
            &rotation.email_domain,
        );

        let mut updates = Vec::with_capacity(to_assign.len());
        for ticket in &to_assign {
            let reviewer = queue.next_available()?;
            let change = FieldChange {
                field: TicketField::SeniorReviewer,
                value: reviewer.handle.clone(),
            };
            self.tickets.update(&ticket.key, std::slice::from_ref(&change))?;
            info!(ticket = %ticket.key, reviewer = %reviewer.handle, "assigned senior reviewer");
            updates.push(UpdateRecord {
                ticket: ticket.key.clone(),
                field: change.field.label().to_string(),
                new_value: change.value,
            });
            queue.requeue(reviewer);
        }

        let persisted_order = queue.persisted_order();
        self.store.save(&persisted_order)?;
        notify::send_summary(
            self.mailer,
            &self.config.notifications,
            UpdateType::SeniorReviewerAssignment,
            &updates,
        )?;

        Ok(AssignmentReport {
            updates,
            skipped: queue.skipped().iter().map(|r| r.email.clone()).collect(),
            persisted_order,
        })
    }

    fn pool(&self) -> Result<Vec<String>> {
        let rotation = &self.config.rotation;
        if !rotation.pool_override.is_empty() {
            return Ok(rotation.pool_override.clone());
        }
        self.directory
            .list_group_members(&rotation.group, &rotation.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{CalendarEvent, Ticket};
    use crate::error::ReviewError;
    use crate::fakes::{FakeCalendar, FakeDirectory, FakeMailer, FakeTickets};
    use crate::store::MemoryRotationStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn config() -> Config {
        let mut cfg = Config::default();
        cfg.rotation.email_domain = "x.com".to_string();
        cfg
    }

    fn tickets(keys: &[&str]) -> Vec<Ticket> {
        keys.iter().map(|k| Ticket::new(*k)).collect()
    }

    fn members(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| format!("{n}@x.com")).collect()
    }

    /// Enough distinct out-of-office days to make someone unavailable.
    fn mark_away(cal: &FakeCalendar, email: &str) {
        cal.set_events(
            email,
            (0..5)
                .map(|i| CalendarEvent {
                    id: format!("ooo-{i}"),
                    start: Some(format!("2026-10-2{i}T00:00:00Z")),
                    ..CalendarEvent::default()
                })
                .collect(),
        );
    }

    struct Harness {
        config: Config,
        tickets: FakeTickets,
        directory: FakeDirectory,
        calendar: FakeCalendar,
        mailer: FakeMailer,
        store: MemoryRotationStore,
    }

    impl Harness {
        fn new(ticket_keys: &[&str], pool: &[&str]) -> Self {
            Self {
                config: config(),
                tickets: FakeTickets {
                    needs_reviewer: tickets(ticket_keys),
                    ..FakeTickets::default()
                },
                directory: FakeDirectory {
                    members: members(pool),
                    ..FakeDirectory::default()
                },
                calendar: FakeCalendar::default(),
                mailer: FakeMailer::default(),
                store: MemoryRotationStore::new(),
            }
        }

        fn run(&self) -> Result<AssignmentReport> {
            AssignmentJob {
                config: &self.config,
                tickets: &self.tickets,
                directory: &self.directory,
                calendar: &self.calendar,
                mailer: &self.mailer,
                store: &self.store,
            }
            .run(today())
        }
    }

    #[test]
    fn skips_unavailable_and_persists_them_first() {
        let h = Harness::new(&["DR-1", "DR-2"], &["a", "b", "c"]);
        mark_away(&h.calendar, "b@x.com");

        let report = h.run().unwrap();

        let assigned: Vec<_> = report.updates.iter().map(|u| u.new_value.as_str()).collect();
        assert_eq!(assigned, ["a", "c"]);
        assert_eq!(report.skipped, members(&["b"]));
        assert_eq!(h.store.snapshot().unwrap(), members(&["b", "a", "c"]));
        assert_eq!(
            h.tickets.updated(),
            vec![
                ("DR-1".to_string(), TicketField::SeniorReviewer, "a".to_string()),
                ("DR-2".to_string(), TicketField::SeniorReviewer, "c".to_string()),
            ]
        );
    }

    #[test]
    fn reuses_reviewers_round_robin() {
        let h = Harness::new(&["DR-1", "DR-2", "DR-3"], &["a", "b"]);
        let report = h.run().unwrap();
        let assigned: Vec<_> = report.updates.iter().map(|u| u.new_value.as_str()).collect();
        assert_eq!(assigned, ["a", "b", "a"]);
        assert_eq!(report.persisted_order, members(&["b", "a"]));
    }

    #[test]
    fn continues_from_persisted_order() {
        let mut h = Harness::new(&["DR-1"], &["a", "b", "c"]);
        h.store = MemoryRotationStore::with_order(members(&["c", "a", "b"]));
        let report = h.run().unwrap();
        assert_eq!(report.updates[0].new_value, "c");
        assert_eq!(h.store.snapshot().unwrap(), members(&["a", "b", "c"]));
    }

    #[test]
    fn new_members_go_ahead_of_persisted_order() {
        let mut h = Harness::new(&["DR-1"], &["a", "b", "new"]);
        h.store = MemoryRotationStore::with_order(members(&["b", "a", "gone"]));
        let report = h.run().unwrap();
        assert_eq!(report.updates[0].new_value, "new");
        assert_eq!(h.store.snapshot().unwrap(), members(&["b", "a", "new"]));
    }

    #[test]
    fn first_run_ranks_by_open_tickets() {
        let mut h = Harness::new(&["DR-1", "DR-2"], &["a", "b", "c"]);
        h.tickets.open_counts = [("a", 4), ("b", 0), ("c", 2)]
            .iter()
            .map(|(n, c)| (n.to_string(), *c))
            .collect();
        let report = h.run().unwrap();
        let assigned: Vec<_> = report.updates.iter().map(|u| u.new_value.as_str()).collect();
        assert_eq!(assigned, ["b", "c"]);
        assert!(h
            .tickets
            .searches
            .borrow()
            .contains(&TicketQuery::OpenForReviewer {
                handle: "a".to_string()
            }));
    }

    #[test]
    fn ranking_failure_degrades_to_pool_order() {
        let mut h = Harness::new(&["DR-1"], &["a", "b"]);
        h.tickets.open_counts = [("a".to_string(), 9)].into_iter().collect();
        h.tickets.fail_counts = true;
        let report = h.run().unwrap();
        assert_eq!(report.updates[0].new_value, "a");
    }

    #[test]
    fn no_available_reviewer_aborts_without_saving() {
        let h = Harness::new(&["DR-1"], &["a", "b"]);
        mark_away(&h.calendar, "a@x.com");
        mark_away(&h.calendar, "b@x.com");
        let err = h.run().unwrap_err();
        assert!(matches!(err, ReviewError::NoAvailableReviewer));
        assert!(h.store.snapshot().is_none());
        assert!(h.mailer.sent().is_empty());
        assert!(h.tickets.updated().is_empty());
    }

    #[test]
    fn sends_one_summary_with_all_updates() {
        let h = Harness::new(&["DR-1", "DR-2"], &["a", "b"]);
        h.run().unwrap();
        let sent = h.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].body.contains("DR-1"));
        assert!(sent[0].body.contains("DR-2"));
        assert!(sent[0].subject.ends_with("SENIOR REVIEWER ASSIGNMENT"));
    }

    #[test]
    fn no_tickets_still_persists_and_reports() {
        let h = Harness::new(&[], &["a", "b"]);
        let report = h.run().unwrap();
        assert!(report.updates.is_empty());
        assert_eq!(h.store.snapshot().unwrap(), members(&["a", "b"]));
        assert_eq!(h.mailer.sent()[0].body, "No updates were made.");
    }

    #[test]
    fn pool_override_bypasses_directory() {
        let mut h = Harness::new(&["DR-1"], &["a"]);
        h.config.rotation.pool_override = members(&["z"]);
        let report = h.run().unwrap();
        assert_eq!(report.updates[0].new_value, "z");
        assert!(h.directory.calls.borrow().is_empty());
    }

    #[test]
    fn directory_is_queried_with_group_and_role() {
        let h = Harness::new(&[], &["a"]);
        h.run().unwrap();
        assert_eq!(
            h.directory.calls.borrow()[0],
            (h.config.rotation.group.clone(), "MANAGER".to_string())
        );
    }

    #[test]
    fn ticket_update_failure_propagates() {
        let mut h = Harness::new(&["DR-1"], &["a"]);
        h.tickets.fail_updates = true;
        assert!(matches!(h.run(), Err(ReviewError::Api { .. })));
        assert!(h.store.snapshot().is_none());
    }
}

//! Round-robin-with-skip reviewer rotation.
//!
//! The starting order comes from the first order source that yields a
//! non-empty list (persisted order, then open-ticket ranking); a source that
//! fails is logged and skipped. Pool members the order does not mention go
//! in front of it, anyone no longer in the pool is dropped.
//!
//! During a run, unavailable reviewers popped off the front are parked in
//! `skipped`. When the order is persisted they come first, so someone who
//! was out this week is offered the next ticket when they are back.

use crate::error::{Result, ReviewError};
use crate::reviewer::Reviewer;
use crate::store::RotationStore;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Order sources
// ---------------------------------------------------------------------------

pub trait OrderSource {
    fn name(&self) -> &'static str;

    fn order(&self, pool: &[String]) -> Result<Vec<String>>;
}

/// The order saved at the end of the previous run.
pub struct PersistedOrder<'a> {
    store: &'a dyn RotationStore,
}

impl<'a> PersistedOrder<'a> {
    pub fn new(store: &'a dyn RotationStore) -> Self {
        Self { store }
    }
}

impl OrderSource for PersistedOrder<'_> {
    fn name(&self) -> &'static str {
        "persisted order"
    }

    fn order(&self, _pool: &[String]) -> Result<Vec<String>> {
        self.store.load()
    }
}

/// Fewest open tickets first.
pub struct OpenTicketRanking<F> {
    count_open: F,
}

impl<F> OpenTicketRanking<F>
where
    F: Fn(&str) -> Result<usize>,
{
    pub fn new(count_open: F) -> Self {
        Self { count_open }
    }
}

impl<F> OrderSource for OpenTicketRanking<F>
where
    F: Fn(&str) -> Result<usize>,
{
    fn name(&self) -> &'static str {
        "open ticket ranking"
    }

    fn order(&self, pool: &[String]) -> Result<Vec<String>> {
        rank_by_open_tickets(pool, &self.count_open)
    }
}

/// Stable ascending sort of `pool` by open-ticket count; ties keep pool order.
pub fn rank_by_open_tickets<F>(pool: &[String], count_open: F) -> Result<Vec<String>>
where
    F: Fn(&str) -> Result<usize>,
{
    let mut counted = Vec::with_capacity(pool.len());
    for id in pool {
        let n = count_open(id)
            .map_err(|e| ReviewError::FallbackRankingFailed(format!("{id}: {e}")))?;
        counted.push((n, id.clone()));
    }
    counted.sort_by_key(|(n, _)| *n);
    Ok(counted.into_iter().map(|(_, id)| id).collect())
}

/// Walk the sources in order; the first non-empty success wins.
/// Exhausting every source yields an empty order (plain pool order).
pub fn resolve_order(sources: &[&dyn OrderSource], pool: &[String]) -> Vec<String> {
    for source in sources {
        match source.order(pool) {
            Ok(order) if !order.is_empty() => {
                debug!(source = source.name(), len = order.len(), "rotation order resolved");
                return order;
            }
            Ok(_) => debug!(source = source.name(), "order source returned nothing"),
            Err(e) => warn!(source = source.name(), error = %e, "order source failed, falling back"),
        }
    }
    Vec::new()
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct RotationQueue {
    queue: VecDeque<Reviewer>,
    skipped: Vec<Reviewer>,
}

impl RotationQueue {
    /// Merge `pool` with a starting `order` into the run's queue.
    ///
    /// Pool members missing from `order` come first, in pool order, followed
    /// by `order` itself. Duplicates and identities outside the pool are
    /// dropped, as is anyone without an `availability` entry.
    pub fn build(
        pool: &[String],
        availability: &HashMap<String, bool>,
        order: Vec<String>,
        email_domain: &str,
    ) -> Self {
        let in_pool: HashSet<&str> = pool.iter().map(String::as_str).collect();
        let ordered: HashSet<&str> = order
            .iter()
            .map(String::as_str)
            .filter(|id| in_pool.contains(id))
            .collect();

        let mut seen = HashSet::new();
        let missing = pool.iter().filter(|id| !ordered.contains(id.as_str()));
        let restored = order.iter().filter(|id| in_pool.contains(id.as_str()));

        let queue = missing
            .chain(restored)
            .filter(|id| seen.insert(id.as_str()))
            .filter_map(|id| {
                availability
                    .get(id)
                    .map(|&available| Reviewer::new(id.clone(), email_domain, available))
            })
            .collect();

        Self {
            queue,
            skipped: Vec::new(),
        }
    }

    /// [`resolve_order`] followed by [`RotationQueue::build`].
    pub fn from_sources(
        pool: &[String],
        availability: &HashMap<String, bool>,
        sources: &[&dyn OrderSource],
        email_domain: &str,
    ) -> Self {
        let order = resolve_order(sources, pool);
        Self::build(pool, availability, order, email_domain)
    }

    /// Pop until an available reviewer turns up. Unavailable ones move to
    /// `skipped`. The returned reviewer is not re-enqueued; call
    /// [`RotationQueue::requeue`] once they have been used.
    pub fn next_available(&mut self) -> Result<Reviewer> {
        while let Some(reviewer) = self.queue.pop_front() {
            if reviewer.available {
                return Ok(reviewer);
            }
            debug!(reviewer = %reviewer.email, "skipping unavailable reviewer");
            self.skipped.push(reviewer);
        }
        Err(ReviewError::NoAvailableReviewer)
    }

    pub fn requeue(&mut self, reviewer: Reviewer) {
        self.queue.push_back(reviewer);
    }

    /// `skipped ++ queue`, the order to persist for the next run.
    pub fn persisted_order(&self) -> Vec<String> {
        self.skipped
            .iter()
            .chain(self.queue.iter())
            .map(|r| r.email.clone())
            .collect()
    }

    pub fn skipped(&self) -> &[Reviewer] {
        &self.skipped
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reviewer> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Crawl frontier: the traversal engine of a session
//!
//! This module handles:
//! - The visited map (one `TargetState` per URL identity)
//! - FIFO queue of pending targets
//! - Exact page-budget enforcement through slot reservation at dequeue
//! - Fan-out limiting with child-first partitioning of discovered links
//!
//! The frontier is a plain owned value. The coordinator is its only user, so
//! none of this state is shared or locked.

use crate::state::TargetState;
use crate::url::{identity_key, is_descendant_path, is_in_scope, CrawlTarget, ScopeRule};
use std::collections::{HashMap, HashSet, VecDeque};
use url::Url;

/// What happened to the links discovered on one page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnqueueOutcome {
    /// Links accepted into the queue
    pub queued: usize,

    /// Links whose identity was already queued, fetched, failed or rejected
    /// (or repeated on the same page)
    pub duplicates: usize,

    /// Links refused by the scope rule (now permanently rejected)
    pub out_of_scope: usize,

    /// In-scope links left unseen because the fan-out limit was reached
    pub over_fan_out: usize,
}

impl EnqueueOutcome {
    /// Total number of links considered
    pub fn total(&self) -> usize {
        self.queued + self.duplicates + self.out_of_scope + self.over_fan_out
    }
}

/// The frontier of one crawl session
///
/// # Budget
///
/// A slot is reserved every time a target is handed out, and the frontier
/// stops handing out targets once `fetched + reserved` reaches the budget.
/// [`Frontier::complete`] turns a reservation into a fetched page;
/// [`Frontier::abandon`] gives the slot back. The fetched count therefore
/// never exceeds the budget, whatever the number of fetches in flight.
#[derive(Debug)]
pub struct Frontier {
    /// State of every identity encountered so far (absent = unseen)
    states: HashMap<String, TargetState>,

    /// Pending targets in insertion order
    queue: VecDeque<CrawlTarget>,

    page_budget: usize,
    fan_out_limit: Option<usize>,
    fetched: usize,
    reserved: usize,
}

impl Frontier {
    /// Creates a frontier holding only the seed, marked queued
    pub fn new(seed: CrawlTarget, page_budget: usize, fan_out_limit: Option<usize>) -> Self {
        let mut states = HashMap::new();
        states.insert(seed.identity.clone(), TargetState::Queued);

        Self {
            states,
            queue: VecDeque::from([seed]),
            page_budget,
            fan_out_limit,
            fetched: 0,
            reserved: 0,
        }
    }

    /// Hands out the next target and reserves a budget slot for it
    ///
    /// Returns `None` when the queue is empty or every remaining slot is
    /// already fetched or reserved. Entries whose identity reached a
    /// terminal state in the meantime (a redirect landed on them) are
    /// dropped without counting.
    pub fn next_target(&mut self) -> Option<CrawlTarget> {
        while self.has_capacity() {
            let target = self.queue.pop_front()?;

            if self.state_of(&target.identity) != TargetState::Queued {
                tracing::trace!("Skipping {} (already {})", target, self.state_of(&target.identity));
                continue;
            }

            self.reserved += 1;
            return Some(target);
        }

        None
    }

    /// Records a successful fetch, converting the reservation into a page
    ///
    /// `final_url` is where redirects ended; its identity is marked fetched
    /// too so the same document is not fetched again under another name.
    /// Returns false (and only frees the slot) if the identity was settled
    /// while the fetch was in flight, e.g. by another page redirecting to it.
    pub fn complete(&mut self, target: &CrawlTarget, final_url: &Url) -> bool {
        self.release_slot();
        if !self.transition(&target.identity, TargetState::Fetched) {
            return false;
        }

        self.fetched += 1;

        let final_identity = identity_key(final_url);
        if final_identity != target.identity {
            match self.state_of(&final_identity) {
                TargetState::Unseen | TargetState::Queued => {
                    self.states.insert(final_identity, TargetState::Fetched);
                }
                _ => {}
            }
        }

        true
    }

    /// Records a failed fetch: the slot is released and the identity is
    /// never tried again
    pub fn abandon(&mut self, target: &CrawlTarget) {
        self.release_slot();
        self.transition(&target.identity, TargetState::Failed);
    }

    /// Releases one reservation without touching any identity
    ///
    /// Used when a fetch task ended without reporting back; its identity
    /// stays queued and is never handed out again.
    pub fn release_slot(&mut self) {
        self.reserved = self.reserved.saturating_sub(1);
    }

    /// Filters the links discovered on `source` and enqueues the eligible ones
    ///
    /// Every link is reduced to its identity first. Identities already known
    /// are skipped; out-of-scope links are rejected for good. Without a
    /// fan-out limit the rest is queued in document order. With a limit,
    /// strict descendants of the source path go first, and any remaining
    /// capacity is filled from the other in-scope links in document order.
    /// In-scope links that do not fit stay unseen and may still be queued
    /// from another page.
    pub fn enqueue_discovered(
        &mut self,
        source: &Url,
        links: &[Url],
        scope: &ScopeRule,
    ) -> EnqueueOutcome {
        let mut outcome = EnqueueOutcome::default();
        let mut seen_on_page = HashSet::new();
        let mut children = Vec::new();
        let mut others = Vec::new();

        for link in links {
            let target = CrawlTarget::new(link.clone());

            if !seen_on_page.insert(target.identity.clone())
                || !self.state_of(&target.identity).is_enqueueable()
            {
                outcome.duplicates += 1;
                continue;
            }

            if !is_in_scope(&target.url, scope) {
                tracing::trace!("Out of scope: {}", target);
                self.states.insert(target.identity, TargetState::Rejected);
                outcome.out_of_scope += 1;
                continue;
            }

            if self.fan_out_limit.is_some() && is_descendant_path(source.path(), target.url.path()) {
                children.push(target);
            } else {
                others.push(target);
            }
        }

        let selected: Vec<CrawlTarget> = match self.fan_out_limit {
            None => others,
            Some(limit) => {
                let total = children.len() + others.len();
                let selected: Vec<CrawlTarget> =
                    children.into_iter().chain(others).take(limit).collect();
                outcome.over_fan_out = total - selected.len();
                selected
            }
        };

        for target in selected {
            tracing::trace!("Queued: {}", target);
            self.states.insert(target.identity.clone(), TargetState::Queued);
            self.queue.push_back(target);
            outcome.queued += 1;
        }

        tracing::debug!(
            "{}: {} links, {} queued, {} duplicate, {} out of scope, {} over fan-out",
            source,
            links.len(),
            outcome.queued,
            outcome.duplicates,
            outcome.out_of_scope,
            outcome.over_fan_out
        );

        outcome
    }

    /// Current state of an identity (`Unseen` if never encountered)
    pub fn state_of(&self, identity: &str) -> TargetState {
        self.states
            .get(identity)
            .copied()
            .unwrap_or(TargetState::Unseen)
    }

    /// Number of targets waiting in the queue
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Returns whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of pages fetched successfully
    pub fn fetched_count(&self) -> usize {
        self.fetched
    }

    /// Number of slots held by fetches in flight
    pub fn reserved_count(&self) -> usize {
        self.reserved
    }

    /// The session's page budget
    pub fn page_budget(&self) -> usize {
        self.page_budget
    }

    /// Returns whether another target may be handed out
    pub fn has_capacity(&self) -> bool {
        self.fetched + self.reserved < self.page_budget
    }

    fn transition(&mut self, identity: &str, next: TargetState) -> bool {
        let current = self.state_of(identity);
        if !current.can_transition_to(next) {
            tracing::debug!("Ignoring transition {} -> {} for {}", current, next, identity);
            return false;
        }

        self.states.insert(identity.to_string(), next);
        true
    }
}

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::trace;

/// §4.9's firing policy: whether a trigger predicate still needs evaluating for a query that
/// is already queued. Either way a query fires at most once per processing pass; the flag
/// only controls whether [`UpdateScheduler::should_check_predicate`] says to skip the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiringPolicy {
    /// Once a query is queued, later trigger firings before the next pass skip predicate
    /// evaluation entirely.
    CoalesceSilently,
    /// Re-evaluate the predicate for every mutation regardless of queued state (the query
    /// still only re-executes once per pass).
    RecheckOnEachFiring,
}

impl Default for FiringPolicy {
    fn default() -> Self {
        FiringPolicy::CoalesceSilently
    }
}

/// Rate-limits how often queued live queries are re-executed (§4.9). Tracks the timestamp of
/// the last processing pass and the set of query ids queued for the next one.
pub struct UpdateScheduler {
    min_interval: Duration,
    policy: FiringPolicy,
    state: Mutex<SchedulerState>,
    coalesced: AtomicU64,
    rechecked: AtomicU64,
}

struct SchedulerState {
    last_pass: Option<Instant>,
    queued: HashSet<u64>,
}

impl UpdateScheduler {
    pub fn new(min_interval_ms: u64, policy: FiringPolicy) -> Self {
        UpdateScheduler {
            min_interval: Duration::from_millis(min_interval_ms),
            policy,
            state: Mutex::new(SchedulerState { last_pass: None, queued: HashSet::new() }),
            coalesced: AtomicU64::new(0),
            rechecked: AtomicU64::new(0),
        }
    }

    /// Queue `query_id` for re-execution on the next processing pass. Idempotent: queueing an
    /// already-queued id is a no-op.
    pub fn queue(&self, query_id: u64) {
        self.state.lock().queued.insert(query_id);
    }

    pub fn is_queued(&self, query_id: u64) -> bool {
        self.state.lock().queued.contains(&query_id)
    }

    /// Whether a trigger predicate for `query_id` is still worth evaluating, per the
    /// configured [`FiringPolicy`]: under `CoalesceSilently` an already-queued query's
    /// predicate is skipped, since the outcome can no longer change whether it fires.
    pub fn should_check_predicate(&self, query_id: u64) -> bool {
        match self.policy {
            FiringPolicy::RecheckOnEachFiring => {
                self.rechecked.fetch_add(1, Ordering::Relaxed);
                true
            }
            FiringPolicy::CoalesceSilently => {
                if self.is_queued(query_id) {
                    self.coalesced.fetch_add(1, Ordering::Relaxed);
                    false
                } else {
                    self.rechecked.fetch_add(1, Ordering::Relaxed);
                    true
                }
            }
        }
    }

    /// Whether enough time has elapsed since the last processing pass to run another one.
    pub fn ready(&self) -> bool {
        let state = self.state.lock();
        match state.last_pass {
            None => true,
            Some(last) => last.elapsed() >= self.min_interval,
        }
    }

    /// Drain the queue for a processing pass, returning the ids to re-execute and resetting
    /// the pass timestamp. New invalidations that arrive during the pass itself re-queue
    /// their query for the next one, since the queue is cleared up front (§4.9).
    pub fn drain(&self) -> Vec<u64> {
        let mut state = self.state.lock();
        state.last_pass = Some(Instant::now());
        let drained: Vec<u64> = state.queued.drain().collect();

        let coalesced = self.coalesced.swap(0, Ordering::Relaxed);
        let rechecked = self.rechecked.swap(0, Ordering::Relaxed);
        trace!(coalesced, rechecked, fired = drained.len(), "drained update scheduler queue");

        drained
    }

    pub fn policy(&self) -> FiringPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queueing_is_idempotent() {
        let scheduler = UpdateScheduler::new(0, FiringPolicy::CoalesceSilently);
        scheduler.queue(1);
        scheduler.queue(1);
        scheduler.queue(2);
        let mut drained = scheduler.drain();
        drained.sort();
        assert_eq!(drained, vec![1, 2]);
    }

    #[test]
    fn coalesce_silently_skips_predicate_once_queued() {
        let scheduler = UpdateScheduler::new(0, FiringPolicy::CoalesceSilently);
        assert!(scheduler.should_check_predicate(1));
        scheduler.queue(1);
        assert!(!scheduler.should_check_predicate(1));
    }

    #[test]
    fn recheck_on_each_firing_always_checks() {
        let scheduler = UpdateScheduler::new(0, FiringPolicy::RecheckOnEachFiring);
        scheduler.queue(1);
        assert!(scheduler.should_check_predicate(1));
    }

    #[test]
    fn drain_empties_the_queue() {
        let scheduler = UpdateScheduler::new(0, FiringPolicy::CoalesceSilently);
        scheduler.queue(1);
        scheduler.drain();
        assert!(scheduler.drain().is_empty());
        assert!(!scheduler.is_queued(1));
    }

    #[test]
    fn ready_before_first_pass() {
        let scheduler = UpdateScheduler::new(60_000, FiringPolicy::CoalesceSilently);
        assert!(scheduler.ready());
    }

    #[test]
    fn not_ready_immediately_after_a_pass_with_nonzero_interval() {
        let scheduler = UpdateScheduler::new(60_000, FiringPolicy::CoalesceSilently);
        scheduler.queue(1);
        scheduler.drain();
        assert!(!scheduler.ready());
    }
}

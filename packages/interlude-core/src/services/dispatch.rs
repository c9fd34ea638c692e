//! Per-player serialization of orchestrations.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Runs at most one orchestration per player at a time.
///
/// Locks are keyed by player uuid rather than group id: a notification on a
/// group member detaches it into a group of its own, so group ids are not
/// stable across an orchestration. Callers lock the coordinator and the
/// player they act on.
#[derive(Debug, Default)]
pub struct GroupDispatcher {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Held locks for a set of player uuids. Released on drop.
#[derive(Debug)]
pub struct DispatchGuard {
    keys: Vec<String>,
    _held: Vec<OwnedMutexGuard<()>>,
}

impl DispatchGuard {
    /// Locked uuids, sorted.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// True when every key in `keys` is already held.
    pub fn covers<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> bool {
        keys.into_iter()
            .all(|key| self.keys.binary_search_by(|held| held.as_str().cmp(key)).is_ok())
    }
}

impl GroupDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until every key is free and holds them until the guard drops.
    ///
    /// Keys are taken in sorted order so overlapping callers cannot deadlock.
    pub async fn lock<I, S>(&self, keys: I) -> DispatchGuard
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        keys.sort_unstable();
        keys.dedup();

        let mut held = Vec::with_capacity(keys.len());
        for key in &keys {
            let lock = self.locks.entry(key.clone()).or_default().clone();
            held.push(lock.lock_owned().await);
        }
        DispatchGuard { keys, _held: held }
    }

    /// Awaits `work` once no other work for any of `keys` is in flight.
    pub async fn run<F, T>(&self, keys: &[&str], work: F) -> T
    where
        F: Future<Output = T>,
    {
        let _guard = self.lock(keys.iter().copied()).await;
        work.await
    }

    /// Number of distinct players that have been locked.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as SyncMutex;
    use std::time::Duration;

    async fn traced(log: &SyncMutex<Vec<String>>, name: &str) {
        log.lock().push(format!("{} start", name));
        tokio::time::sleep(Duration::from_millis(50)).await;
        log.lock().push(format!("{} end", name));
    }

    fn assert_serialized(log: &[String]) {
        assert_eq!(log.len(), 4);
        for pair in log.chunks(2) {
            let name = pair[0].trim_end_matches(" start");
            assert_eq!(pair[1], format!("{} end", name));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn same_player_runs_one_at_a_time() {
        let dispatcher = GroupDispatcher::new();
        let log = SyncMutex::new(Vec::new());

        tokio::join!(
            dispatcher.run(&["RINCON_A"], traced(&log, "first")),
            dispatcher.run(&["RINCON_A"], traced(&log, "second")),
        );

        assert_serialized(&log.lock());
        assert_eq!(dispatcher.key_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_key_sets_wait_for_each_other() {
        let dispatcher = GroupDispatcher::new();
        let log = SyncMutex::new(Vec::new());

        // Opposite orders on purpose: sorting keeps this from deadlocking
        tokio::join!(
            dispatcher.run(&["RINCON_B", "RINCON_A"], traced(&log, "joiner")),
            dispatcher.run(&["RINCON_A", "RINCON_B"], traced(&log, "group")),
        );

        assert_serialized(&log.lock());
        assert_eq!(dispatcher.key_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn disjoint_players_overlap() {
        let dispatcher = GroupDispatcher::new();
        let log = SyncMutex::new(Vec::new());

        tokio::join!(
            dispatcher.run(&["RINCON_A"], traced(&log, "a")),
            dispatcher.run(&["RINCON_C"], traced(&log, "c")),
        );

        let log = log.lock();
        assert!(log[..2].iter().all(|entry| entry.ends_with("start")), "{:?}", log);
        assert_eq!(dispatcher.key_count(), 2);
    }

    #[tokio::test]
    async fn guard_reports_sorted_unique_keys() {
        let dispatcher = GroupDispatcher::new();
        let guard = dispatcher.lock(["RINCON_B", "RINCON_A", "RINCON_B"]).await;

        assert_eq!(guard.keys(), ["RINCON_A", "RINCON_B"]);
        assert!(guard.covers(["RINCON_B"]));
        assert!(guard.covers(["RINCON_A", "RINCON_B"]));
        assert!(!guard.covers(["RINCON_A", "RINCON_C"]));

        drop(guard);
        let again = dispatcher.lock(["RINCON_A"]).await;
        assert!(again.covers(["RINCON_A"]));
    }
}

use crate::directory::record::{LocationRecord, UpdateKey};
use std::collections::{HashMap, HashSet};

/// Result of offering a propagated update to the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// The record was stored; the update should keep flooding.
    Applied,
    /// We already hold a record at least as new.
    Stale,
    /// Not newer, and this exact update (client + timestamp) was stored here before.
    Duplicate,
}

impl StoreOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, StoreOutcome::Applied)
    }
}

/// LocationDirectory holds the latest known location per client.
///
/// Store methods are CAS-like: they read, compare and write in one call, so an implementation
/// owned by a single task can never interleave two updates for the same client.
pub(crate) trait LocationDirectory {
    fn lookup(&self, client_id: &str) -> Option<LocationRecord>;

    /// A client reported its own location to us. Always wins locally.
    fn store_client_report(&mut self, record: LocationRecord);

    /// Store a record received from a peer iff we have nothing for that client or the new
    /// `reported_at` is strictly greater than the stored one.
    fn store_if_newer(&mut self, record: LocationRecord) -> StoreOutcome;
}

// Memory only. A restarted server starts empty and re-learns from clients and peers.
pub(crate) struct VolatileDirectory {
    records: HashMap<String, LocationRecord>,
    seen_updates: HashSet<UpdateKey>,
    seen_capacity: usize,
}

impl VolatileDirectory {
    pub(crate) fn new(seen_capacity: usize) -> Self {
        VolatileDirectory {
            records: HashMap::new(),
            seen_updates: HashSet::new(),
            seen_capacity,
        }
    }

    fn remember(&mut self, key: UpdateKey) {
        // Coarse bound on memory. Forgetting only changes how a rejection is classified.
        if self.seen_updates.len() >= self.seen_capacity {
            self.seen_updates.clear();
        }
        self.seen_updates.insert(key);
    }
}

impl LocationDirectory for VolatileDirectory {
    fn lookup(&self, client_id: &str) -> Option<LocationRecord> {
        self.records.get(client_id).cloned()
    }

    fn store_client_report(&mut self, record: LocationRecord) {
        self.remember(record.update_key());
        self.records.insert(record.client_id.clone(), record);
    }

    fn store_if_newer(&mut self, record: LocationRecord) -> StoreOutcome {
        let key = record.update_key();

        if let Some(existing) = self.records.get(&record.client_id) {
            if record.reported_at <= existing.reported_at {
                if self.seen_updates.contains(&key) {
                    return StoreOutcome::Duplicate;
                }
                return StoreOutcome::Stale;
            }
        }

        self.remember(key);
        self.records.insert(record.client_id.clone(), record);
        StoreOutcome::Applied
    }
}

//! Per-chat generation coordinator.
//!
//! Serializes generation per chat and makes result delivery idempotent.
//! The four public operations are the *entire* surface: no other code may
//! read or mutate a record. Admission is advisory — the lock is held only
//! for the table operation, never across the pipeline — so a second
//! trigger for a busy chat is rejected immediately rather than queued.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

/// Per-chat bookkeeping. Presence in the table means a run is active.
#[derive(Debug)]
struct GenerationRecord {
    /// Correlation id of the run that was admitted for this chat.
    correlation_id: Uuid,
    /// Set once the run's result has been handed to delivery.
    result_sent: bool,
}

/// Concurrency guard over all chats.
///
/// Constructed once per process and shared by `Arc` into every task.
#[derive(Debug, Default)]
pub struct GenerationCoordinator {
    records: Mutex<HashMap<i64, GenerationRecord>>,
}

impl GenerationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the table, recovering from a poisoned mutex: a panicked task
    /// must not wedge every other chat's admissions.
    fn records(&self) -> MutexGuard<'_, HashMap<i64, GenerationRecord>> {
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Try to admit a new generation run for `chat_id`.
    ///
    /// Returns `false` when a run is already active for the chat. Atomic
    /// with respect to concurrent triggers: check and insert happen under
    /// one lock.
    pub fn try_admit(&self, chat_id: i64, correlation_id: Uuid) -> bool {
        let mut records = self.records();
        if records.contains_key(&chat_id) {
            return false;
        }
        records.insert(
            chat_id,
            GenerationRecord {
                correlation_id,
                result_sent: false,
            },
        );
        true
    }

    /// Is this run still the authoritative one for the chat?
    ///
    /// `false` once a result has been delivered, or when the stored
    /// correlation id differs from the caller's (a newer run took over).
    /// A missing record counts as "deliver" — the run is assumed to have
    /// been cleared externally, not superseded.
    pub fn should_deliver(&self, chat_id: i64, correlation_id: Uuid) -> bool {
        match self.records().get(&chat_id) {
            None => true,
            Some(record) => !record.result_sent && record.correlation_id == correlation_id,
        }
    }

    /// Record that the chat's result has been delivered. No-op when no
    /// record exists.
    pub fn mark_delivered(&self, chat_id: i64) {
        if let Some(record) = self.records().get_mut(&chat_id) {
            record.result_sent = true;
        }
    }

    /// Remove the chat's record unconditionally. Called on success,
    /// recoverable failure and fatal failure alike.
    pub fn release(&self, chat_id: i64) {
        self.records().remove(&chat_id);
    }

    /// A guard that releases `chat_id` when dropped, so the record is
    /// removed on every exit path of a generation task, panics included.
    pub fn release_guard(self: &Arc<Self>, chat_id: i64) -> ReleaseGuard {
        ReleaseGuard {
            coordinator: Arc::clone(self),
            chat_id,
        }
    }
}

/// Releases a chat's generation record on drop.
pub struct ReleaseGuard {
    coordinator: Arc<GenerationCoordinator>,
    chat_id: i64,
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.coordinator.release(self.chat_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT: i64 = 77;

    #[test]
    fn second_admission_is_rejected_until_release() {
        let coordinator = GenerationCoordinator::new();
        let first = Uuid::new_v4();
        assert!(coordinator.try_admit(CHAT, first));
        assert!(!coordinator.try_admit(CHAT, Uuid::new_v4()));

        coordinator.release(CHAT);
        assert!(coordinator.try_admit(CHAT, Uuid::new_v4()));
    }

    #[test]
    fn different_chats_are_independent() {
        let coordinator = GenerationCoordinator::new();
        assert!(coordinator.try_admit(1, Uuid::new_v4()));
        assert!(coordinator.try_admit(2, Uuid::new_v4()));
    }

    #[test]
    fn delivery_happens_at_most_once() {
        let coordinator = GenerationCoordinator::new();
        let id = Uuid::new_v4();
        coordinator.try_admit(CHAT, id);

        assert!(coordinator.should_deliver(CHAT, id));
        coordinator.mark_delivered(CHAT);
        assert!(!coordinator.should_deliver(CHAT, id));
    }

    #[test]
    fn stale_correlation_id_is_not_delivered() {
        let coordinator = GenerationCoordinator::new();
        coordinator.try_admit(CHAT, Uuid::new_v4());
        assert!(!coordinator.should_deliver(CHAT, Uuid::new_v4()));
    }

    #[test]
    fn missing_record_fails_open() {
        let coordinator = GenerationCoordinator::new();
        assert!(coordinator.should_deliver(CHAT, Uuid::new_v4()));
    }

    #[test]
    fn mark_delivered_without_record_is_a_noop() {
        let coordinator = GenerationCoordinator::new();
        coordinator.mark_delivered(CHAT);
        assert!(coordinator.should_deliver(CHAT, Uuid::new_v4()));
    }

    #[test]
    fn concurrent_admissions_admit_exactly_one() {
        let coordinator = Arc::new(GenerationCoordinator::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                std::thread::spawn(move || coordinator.try_admit(CHAT, Uuid::new_v4()))
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|admitted| *admitted)
            .count();
        assert_eq!(admitted, 1);
    }

    #[test]
    fn guard_releases_on_panic() {
        let coordinator = Arc::new(GenerationCoordinator::new());
        coordinator.try_admit(CHAT, Uuid::new_v4());

        let inner = Arc::clone(&coordinator);
        let result = std::thread::spawn(move || {
            let _guard = inner.release_guard(CHAT);
            panic!("task blew up");
        })
        .join();
        assert!(result.is_err());

        // The record is gone, a new run can be admitted.
        assert!(coordinator.try_admit(CHAT, Uuid::new_v4()));
    }
}

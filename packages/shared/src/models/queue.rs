use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::participant::Participant;

/// A single waiting player and the time they checked in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub participant: Participant,
    pub enqueued_at: DateTime<Utc>,
}

/// The FIFO line of waiting players. Position is the sole priority signal;
/// the only reordering operation is `move_to_back` (skip semantics).
#[derive(Debug, Clone, Default)]
pub struct WaitQueue {
    entries: VecDeque<QueueEntry>,
}

impl WaitQueue {
    pub fn new() -> Self {
        WaitQueue::default()
    }

    pub fn from_entries(entries: Vec<QueueEntry>) -> Self {
        WaitQueue {
            entries: entries.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, participant_id: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.participant.id == participant_id)
    }

    /// Appends to the tail with the current timestamp.
    pub fn enqueue(&mut self, participant: Participant) {
        self.entries.push_back(QueueEntry {
            participant,
            enqueued_at: Utc::now(),
        });
    }

    /// Removes and returns the first `n` entries in order.
    pub fn dequeue_front(&mut self, n: usize) -> Vec<QueueEntry> {
        let n = n.min(self.entries.len());
        self.entries.drain(..n).collect()
    }

    /// Removes the entry for `participant_id` if present; `None` when absent.
    pub fn remove(&mut self, participant_id: &str) -> Option<QueueEntry> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.participant.id == participant_id)?;
        self.entries.remove(index)
    }

    /// Skip: re-appends at the tail with a fresh timestamp. Returns false
    /// (and does nothing) when the player is not queued.
    pub fn move_to_back(&mut self, participant_id: &str) -> bool {
        match self.remove(participant_id) {
            Some(entry) => {
                self.enqueue(entry.participant);
                true
            }
            None => false,
        }
    }

    /// Read-only ordered view for assignment decisions.
    pub fn peek_ordered(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }
}

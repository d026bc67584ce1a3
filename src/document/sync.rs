//! Ordered patch delivery between two document replicas.
//!
//! Each connection owns one [`PatchOutbox`] on the sending side and one
//! [`PatchInbox`] on the receiving side. Patches are numbered in the order
//! they were queued and must be applied in exactly that order.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::document::{Document, PatchMessage};
use crate::error::{SceneError, SceneResult};

/// A patch tagged with its position in the connection's stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencedPatch {
    pub sequence: u64,
    pub message: PatchMessage,
}

/// FIFO of patches waiting to be sent on one connection.
#[derive(Debug, Default)]
pub struct PatchOutbox {
    next_sequence: u64,
    queue: VecDeque<SequencedPatch>,
}

impl PatchOutbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a message and returns its sequence number.
    pub fn push(&mut self, message: PatchMessage) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        trace!(sequence, events = message.events.len(), "patch queued");
        self.queue.push_back(SequencedPatch { sequence, message });
        sequence
    }

    /// Queues the document's pending events, if any.
    pub fn collect_from(&mut self, document: &mut Document) -> Option<u64> {
        document.take_patch().map(|message| self.push(message))
    }

    /// Next patch to put on the wire.
    pub fn dispatch(&mut self) -> Option<SequencedPatch> {
        self.queue.pop_front()
    }

    /// Cancels a queued patch that has not been dispatched yet.
    ///
    /// Later patches keep their numbers, so the receiver rejects them until
    /// the connection is resynchronized from a full snapshot.
    pub fn cancel(&mut self, sequence: u64) -> bool {
        let Some(position) = self
            .queue
            .iter()
            .position(|patch| patch.sequence == sequence)
        else {
            return false;
        };
        self.queue.remove(position);
        debug!(sequence, "queued patch cancelled");
        true
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Receiving side of a connection.
#[derive(Debug, Default)]
pub struct PatchInbox {
    expected: u64,
}

impl PatchInbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn expected(&self) -> u64 {
        self.expected
    }

    /// Applies `patch` if it is the next one in sequence. A patch the
    /// document rejects does not advance the sequence.
    pub fn receive(&mut self, document: &mut Document, patch: &SequencedPatch) -> SceneResult<()> {
        if patch.sequence != self.expected {
            return Err(SceneError::OutOfOrderPatch {
                expected: self.expected,
                actual: patch.sequence,
            });
        }
        document.apply_patch(&patch.message)?;
        self.expected += 1;
        Ok(())
    }

    /// Restarts numbering after a full resynchronization.
    pub fn reset(&mut self, expected: u64) {
        self.expected = expected;
    }
}

//! Unreliable, sequenced message channels over UDP.
//!
//! Each message carries a wrapping `u16` sequence number. The receiving side
//! only accepts messages newer than the last one it accepted, so stale and
//! duplicated datagrams are dropped and what gets through is in order.

/// Returns whether `s1` is newer than `s2`, accounting for wrap-around.
pub fn sequence_greater_than(s1: u16, s2: u16) -> bool {
    ((s1 > s2) && (s1 - s2 <= 32768)) || ((s1 < s2) && (s2 - s1 > 32768))
}

#[derive(Debug, Clone, Default)]
pub struct SequencedSender {
    next: u16,
}

impl SequencedSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the sequence number for the next outgoing message.
    pub fn next_sequence(&mut self) -> u16 {
        let sequence = self.next;
        self.next = self.next.wrapping_add(1);
        sequence
    }
}

#[derive(Debug, Clone, Default)]
pub struct SequencedReceiver {
    last_accepted: Option<u16>,
    dropped: u64,
}

impl SequencedReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the message should be processed.
    pub fn accept(&mut self, sequence: u16) -> bool {
        let newer = match self.last_accepted {
            None => true,
            Some(last) => sequence_greater_than(sequence, last),
        };

        if newer {
            self.last_accepted = Some(sequence);
        } else {
            self.dropped += 1;
        }
        newer
    }

    pub fn last_accepted(&self) -> Option<u16> {
        self.last_accepted
    }

    /// Messages rejected as stale or duplicated so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

//! Tick tickets guarding against stale timer callbacks.
//!
//! A driver that schedules a tick takes a [`TickTicket`] first and hands it
//! back when the tick fires. Any command issued in between invalidates the
//! ticket, so a tick queued before a pause or reset can no longer mutate
//! state.

/// Proof that a tick was scheduled against a particular generation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickTicket {
    generation: u64,
}

/// Generation counter shared by everything that accepts ticks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickGate {
    generation: u64,
}

impl TickGate {
    pub fn issue(&self) -> TickTicket {
        TickTicket {
            generation: self.generation,
        }
    }

    /// Invalidate every ticket issued so far
    pub fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn admits(&self, ticket: TickTicket) -> bool {
        ticket.generation == self.generation
    }
}

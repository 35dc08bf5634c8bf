use std::sync::atomic::{AtomicU64, Ordering};

/// Sequence number handed out when a request is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Orders overlapping requests for the same resource so that a slow, older
/// response never replaces a newer one that already landed.
///
/// Every dispatch takes a ticket; a response may only be applied while its
/// ticket is newer than the last applied one.
#[derive(Debug, Default)]
pub struct RequestFence {
    issued: AtomicU64,
    applied: AtomicU64,
}

impl RequestFence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_ticket(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Claims the right to apply the response for `ticket`. Returns false if
    /// a newer (or the same) ticket was applied first.
    pub fn try_apply(&self, ticket: Ticket) -> bool {
        self.applied
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |applied| {
                (ticket.0 > applied).then_some(ticket.0)
            })
            .is_ok()
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.issued.load(Ordering::SeqCst) == ticket.0
    }

    pub fn last_applied(&self) -> u64 {
        self.applied.load(Ordering::SeqCst)
    }
}

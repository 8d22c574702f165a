//! Policy dispatch interface.
//!
//! A policy is the bundle of callbacks a port consults on every arrival and
//! departure: queue selection, congestion detection and reaction, the two
//! ordering keys, and output scheduling. Policies are bound to a port by
//! their `init_port` function, resolved through the
//! [registry](crate::registry).
//!
//! Callbacks run on the caller's thread, must not block, and are treated as
//! pure with respect to the packet and queue they are given. Tuning values
//! belong in a per-policy parameter struct captured at construction, not in
//! hidden globals.

use std::sync::Arc;

use crate::error::SchedError;
use crate::packet::PacketRef;
use crate::port::{Port, PortBuilder};
use crate::queue::DualIndexQueue;

// ─── Congestion actions ─────────────────────────────────────────────────────

/// What to do with an arriving packet when its queue is congested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CongestionAction {
    /// Evict the oldest packet at the smallest admission key, then admit.
    DropHead = 1,
    /// Evict the oldest packet at the largest admission key, then admit.
    DropTail = 2,
    /// Release the arriving packet and count a drop; admit nothing.
    DropIncoming = 3,
}

impl CongestionAction {
    /// Decode from the raw integer used across the loadable-policy boundary.
    pub fn from_raw(raw: u32) -> Result<Self, SchedError> {
        match raw {
            1 => Ok(CongestionAction::DropHead),
            2 => Ok(CongestionAction::DropTail),
            3 => Ok(CongestionAction::DropIncoming),
            other => Err(SchedError::BadAction(other)),
        }
    }

    /// Raw integer for the loadable-policy boundary.
    pub fn as_raw(self) -> u32 {
        self as u32
    }
}

// ─── Policy ─────────────────────────────────────────────────────────────────

/// The per-port callback bundle.
///
/// `select` and `schedule` may return the same index (strict priority over a
/// single queue) or different ones (work-conserving strategies).
pub trait Policy: Send + Sync {
    /// Pick the queue an arriving packet is admitted to. Out of range is a
    /// policy bug and surfaces as [`SchedError::BadQueue`].
    fn select(&self, port: &Port, pkt: PacketRef) -> usize;

    /// Whether the queue must shed load before admitting another packet.
    fn congested(&self, queue: &DualIndexQueue) -> bool;

    /// How the queue sheds load; consulted only when `congested` holds.
    fn on_congestion(&self, queue: &DualIndexQueue, pkt: PacketRef) -> CongestionAction;

    /// Admission key: orders packets for eviction.
    fn admission_key(&self, queue: &DualIndexQueue, pkt: PacketRef) -> u64;

    /// Processing key: orders packets for transmission.
    fn processing_key(&self, queue: &DualIndexQueue, pkt: PacketRef) -> u64;

    /// Pick the queue the next outgoing packet is taken from. An
    /// out-of-range index means nothing is eligible.
    fn schedule(&self, port: &Port) -> usize;
}

/// Shared handle to a port's bound policy.
pub type PolicyHandle = Arc<dyn Policy>;

/// Installs a port's queues and policy binding.
///
/// A plain `fn` rather than a closure so the registry can unregister by
/// function identity.
pub type InitPortFn = fn(&mut PortBuilder) -> Result<(), SchedError>;

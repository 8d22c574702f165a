//! # Scheduler
//!
//! The enqueue/dequeue state machine over one port.
//!
//! On arrival the policy picks a queue; if the queue is congested the policy
//! also picks how it sheds load (evict at the admission tail or head, or
//! drop the arrival). A single arrival triggers at most one admission
//! attempt and at most one eviction; the scheduler never retries. On
//! departure the policy picks a queue and the packet with the largest
//! processing key leaves it.
//!
//! Each scheduler is single-writer: the collaborator serializes enqueue and
//! dequeue on one port, typically behind a per-port lock above this crate.
//! Distinct ports are fully independent. Dropped packets go back to their
//! owner through the release callback, exactly once per drop.

use std::sync::Arc;

use tracing::{trace, warn};

use crate::dump::PortDump;
use crate::error::SchedError;
use crate::packet::PacketRef;
use crate::policy::{CongestionAction, Policy};
use crate::port::Port;
use crate::registry::PolicyRegistry;

// ─── Outcome ────────────────────────────────────────────────────────────────

/// How an arrival was resolved. A drop is a success, not an error; the
/// upstream is never told to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Admitted to an uncongested queue.
    Admitted,
    /// Admitted after evicting a victim.
    AdmittedAfterEvict,
    /// The arriving packet itself was released.
    DroppedIncoming,
}

/// Returns a dropped packet to its owner. Invoked exactly once per drop.
pub type ReleaseFn = Box<dyn FnMut(PacketRef) + Send>;

// ─── Scheduler ──────────────────────────────────────────────────────────────

/// Enqueue/dequeue state machine over one [`Port`].
pub struct Scheduler {
    port: Port,
    release: ReleaseFn,
}

impl Scheduler {
    /// Wrap an initialized port.
    pub fn new(port: Port, release: ReleaseFn) -> Self {
        Scheduler { port, release }
    }

    /// Resolve `policy_name` in `registry` and build the port in one step.
    pub fn with_policy(
        policy_name: &str,
        registry: &PolicyRegistry,
        release: ReleaseFn,
    ) -> Result<Self, SchedError> {
        Ok(Scheduler::new(Port::new(policy_name, registry)?, release))
    }

    pub fn port(&self) -> &Port {
        &self.port
    }

    /// Admit one arriving packet.
    ///
    /// On `NoMemory` the arrival was not admitted; it has already been handed
    /// to the release callback if an eviction preceded the failed insert,
    /// and stays with the caller otherwise.
    pub fn enqueue(&mut self, pkt: PacketRef) -> Result<EnqueueOutcome, SchedError> {
        let policy = Arc::clone(self.port.policy());

        let q = policy.select(&self.port, pkt);
        if q >= self.port.num_queues() {
            warn!(
                port = self.port.name(),
                queue = q,
                "policy selected out-of-range queue"
            );
            return Err(SchedError::BadQueue(q));
        }

        if !policy.congested(&self.port.queues()[q]) {
            self.admit(policy.as_ref(), q, pkt)?;
            trace!(port = self.port.name(), queue = q, "admitted");
            return Ok(EnqueueOutcome::Admitted);
        }

        match policy.on_congestion(&self.port.queues()[q], pkt) {
            CongestionAction::DropTail => {
                let victim = self.port.queues_mut()[q].pop_by_admission_tail()?;
                self.evict_then_admit(policy.as_ref(), q, pkt, victim)
            }
            CongestionAction::DropHead => {
                let victim = self.port.queues_mut()[q].pop_by_admission_head()?;
                self.evict_then_admit(policy.as_ref(), q, pkt, victim)
            }
            CongestionAction::DropIncoming => {
                (self.release)(pkt);
                self.port.queues_mut()[q].note_drop();
                trace!(port = self.port.name(), queue = q, "dropped incoming");
                Ok(EnqueueOutcome::DroppedIncoming)
            }
        }
    }

    /// Release the victim, if one was found, then admit `pkt`. A second
    /// eviction is never attempted: if the insert still fails, the arrival is
    /// released and counted as dropped before the error surfaces.
    fn evict_then_admit(
        &mut self,
        policy: &dyn Policy,
        q: usize,
        pkt: PacketRef,
        victim: Option<PacketRef>,
    ) -> Result<EnqueueOutcome, SchedError> {
        let evicted = victim.is_some();
        if let Some(victim) = victim {
            (self.release)(victim);
            self.port.queues_mut()[q].note_drop();
            trace!(port = self.port.name(), queue = q, "evicted for arrival");
        }

        match self.admit(policy, q, pkt) {
            Ok(()) => Ok(if evicted {
                EnqueueOutcome::AdmittedAfterEvict
            } else {
                EnqueueOutcome::Admitted
            }),
            Err(SchedError::NoMemory) => {
                (self.release)(pkt);
                self.port.queues_mut()[q].note_drop();
                warn!(port = self.port.name(), queue = q, "no room after eviction");
                Err(SchedError::NoMemory)
            }
            Err(e) => Err(e),
        }
    }

    fn admit(&mut self, policy: &dyn Policy, q: usize, pkt: PacketRef) -> Result<(), SchedError> {
        let (a_key, p_key) = {
            let queue = &self.port.queues()[q];
            (
                policy.admission_key(queue, pkt),
                policy.processing_key(queue, pkt),
            )
        };
        self.port.queues_mut()[q].insert(pkt, a_key, p_key)
    }

    /// Take the next outgoing packet, if any eligible queue holds one.
    pub fn dequeue(&mut self) -> Result<Option<PacketRef>, SchedError> {
        let policy = Arc::clone(self.port.policy());
        let q = policy.schedule(&self.port);
        if q >= self.port.num_queues() {
            return Ok(None);
        }
        self.port.queues_mut()[q].pop_by_processing()
    }

    /// Read-only counter snapshot.
    pub fn dump(&self) -> PortDump {
        self.port.dump()
    }

    /// Release every held packet and zero all per-queue counters.
    pub fn reset(&mut self) {
        for queue in self.port.queues_mut() {
            queue.reset(&mut *self.release);
        }
    }
}

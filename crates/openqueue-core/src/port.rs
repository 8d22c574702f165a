//! Ports: named collections of bounded queues governed by one policy.
//!
//! A port is built by a registered policy's `init_port` function, which gets
//! a [`PortBuilder`] to install queues and bind the callbacks. Once
//! construction succeeds the queue count is frozen for the port's lifetime;
//! a failed `init_port` leaves nothing behind.

use compact_str::CompactString;

use crate::dump::{PortDump, QueueDump};
use crate::error::SchedError;
use crate::policy::PolicyHandle;
use crate::queue::DualIndexQueue;
use crate::registry::PolicyRegistry;
use crate::{MAX_QUEUES, NAME_MAX};

/// Truncate to [`NAME_MAX`] bytes on a char boundary, the way the fixed-width
/// transport record does.
pub(crate) fn truncate_name(name: &str) -> CompactString {
    if name.len() <= NAME_MAX {
        return CompactString::from(name);
    }
    let mut end = NAME_MAX;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    CompactString::from(&name[..end])
}

// ─── Port ───────────────────────────────────────────────────────────────────

/// A named, fixed-size collection of queues with a bound policy.
pub struct Port {
    name: CompactString,
    queues: Vec<DualIndexQueue>,
    policy: PolicyHandle,
}

impl Port {
    /// Resolve `policy_name` in `registry` and let its `init_port` populate
    /// a new port.
    pub fn new(policy_name: &str, registry: &PolicyRegistry) -> Result<Port, SchedError> {
        let init = registry
            .lookup(policy_name)
            .ok_or_else(|| SchedError::PolicyMissing(policy_name.into()))?;
        let mut builder = PortBuilder::new();
        init(&mut builder)?;
        builder.finish()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of queues; fixed at construction.
    pub fn num_queues(&self) -> usize {
        self.queues.len()
    }

    /// Queue at `idx`, if in range.
    pub fn queue(&self, idx: usize) -> Option<&DualIndexQueue> {
        self.queues.get(idx)
    }

    pub fn queues(&self) -> &[DualIndexQueue] {
        &self.queues
    }

    pub(crate) fn queues_mut(&mut self) -> &mut [DualIndexQueue] {
        &mut self.queues
    }

    pub(crate) fn policy(&self) -> &PolicyHandle {
        &self.policy
    }

    /// Read-only counter snapshot.
    pub fn dump(&self) -> PortDump {
        PortDump {
            port_name: self.name.clone(),
            queues: self
                .queues
                .iter()
                .map(|q| QueueDump {
                    name: CompactString::from(q.name()),
                    max_len: q.capacity(),
                    len: q.len(),
                    dropped: q.dropped(),
                    total: q.total_admitted(),
                })
                .collect(),
        }
    }
}

// ─── PortBuilder ────────────────────────────────────────────────────────────

/// A port under construction, handed to a policy's `init_port`.
pub struct PortBuilder {
    name: CompactString,
    queues: Vec<DualIndexQueue>,
    policy: Option<PolicyHandle>,
}

impl PortBuilder {
    pub fn new() -> Self {
        PortBuilder {
            name: CompactString::default(),
            queues: Vec::new(),
            policy: None,
        }
    }

    /// Name the port; truncated at 32 bytes.
    pub fn set_name(&mut self, name: &str) {
        self.name = truncate_name(name);
    }

    /// Append a queue and return its index. Queue names must be distinct
    /// within the port; at most [`MAX_QUEUES`] queues.
    pub fn add_queue(&mut self, name: &str, capacity: i32) -> Result<usize, SchedError> {
        if self.queues.len() == MAX_QUEUES {
            return Err(SchedError::BadConfig("too many queues"));
        }
        let name = truncate_name(name);
        if self.queues.iter().any(|q| q.name() == name) {
            return Err(SchedError::BadConfig("duplicate queue name"));
        }
        self.queues.push(DualIndexQueue::new(&name, capacity));
        Ok(self.queues.len() - 1)
    }

    /// Bind the policy callbacks.
    pub fn set_policy(&mut self, policy: PolicyHandle) {
        self.policy = Some(policy);
    }

    /// Seal the builder into a usable port.
    pub fn finish(self) -> Result<Port, SchedError> {
        let policy = self
            .policy
            .ok_or(SchedError::BadConfig("no policy bound"))?;
        if self.queues.is_empty() {
            return Err(SchedError::BadConfig("port has no queues"));
        }
        Ok(Port {
            name: self.name,
            queues: self.queues,
            policy,
        })
    }
}

impl Default for PortBuilder {
    fn default() -> Self {
        Self::new()
    }
}

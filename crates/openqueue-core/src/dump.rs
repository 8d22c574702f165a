//! Read-only port statistics.
//!
//! Snapshots are taken under whatever mutual exclusion the caller already
//! uses to serialize scheduler operations; the counters themselves are not
//! individually atomic.

use std::fmt;

use compact_str::CompactString;
use serde::Serialize;

/// Per-queue counter snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueDump {
    pub name: CompactString,
    /// Configured capacity in packets.
    pub max_len: i32,
    /// Packets currently held.
    pub len: i32,
    /// Packets dropped (evictions plus dropped arrivals).
    pub dropped: i32,
    /// Packets admitted over the queue's lifetime.
    pub total: i32,
}

/// Port-wide snapshot of queue counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortDump {
    pub port_name: CompactString,
    pub queues: Vec<QueueDump>,
}

impl PortDump {
    pub fn num_queues(&self) -> usize {
        self.queues.len()
    }
}

impl fmt::Display for PortDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Port: {}", self.port_name)?;
        for q in &self.queues {
            writeln!(
                f,
                "Queue: {}, Max: {}, Curr: {}, Dropped: {}, Total: {}",
                q.name, q.max_len, q.len, q.dropped, q.total
            )?;
        }
        Ok(())
    }
}

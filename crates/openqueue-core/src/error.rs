//! Error vocabulary for the scheduling core.

use compact_str::CompactString;
use thiserror::Error;

/// Errors surfaced by the scheduling core.
///
/// Dropped packets are never errors; they are an accepted outcome reflected
/// in the per-queue counters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedError {
    /// A policy selected a queue index outside the port's range.
    #[error("queue index {0} out of range")]
    BadQueue(usize),
    /// A raw congestion action from the policy ABI could not be decoded.
    #[error("unknown congestion action {0}")]
    BadAction(u32),
    /// Entry allocation failed; the queue is unchanged.
    #[error("packet entry pool exhausted")]
    NoMemory,
    /// A policy with this name is already registered.
    #[error("policy {0:?} already registered")]
    PolicyExists(CompactString),
    /// No policy is registered under this name.
    #[error("no policy registered as {0:?}")]
    PolicyMissing(CompactString),
    /// A dual-index invariant was violated. Fatal for the operation; the
    /// queue does not attempt to heal itself.
    #[error("queue invariant violated: {0}")]
    Invariant(&'static str),
    /// `init_port` produced an unusable port configuration.
    #[error("bad port configuration: {0}")]
    BadConfig(&'static str),
}

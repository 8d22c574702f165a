//! # openqueue-core
//!
//! Programmable packet scheduling for a network port.
//!
//! A port carries a configurable set of bounded queues, and a per-port policy
//! decides how arriving packets are admitted, how outgoing packets are
//! selected, and how a full queue sheds load. Admission order and
//! transmission order are decoupled: every enqueued packet is indexed by an
//! admission key and a processing key at the same time, so the scheduler can
//! serve packets in a different order than it accepted them while still
//! evicting consistently from both views.
//!
//! ## Crate structure
//!
//! - [`packet`] — Opaque descriptors for externally owned packets
//! - [`queue`] — The dual-index queue data structure
//! - [`policy`] — Policy callbacks, congestion actions
//! - [`port`] — Named queue collections with a bound policy
//! - [`scheduler`] — Enqueue/dequeue state machine
//! - [`registry`] — Process-wide policy name → `init_port` map
//! - [`dump`] — Read-only counter snapshots
//! - [`wire`] — Fixed-width transport record for config/dump payloads
//! - [`policies`] — Shipped example policies
//!
//! The core is I/O-free and never suspends. Each port is single-writer: the
//! caller serializes enqueue and dequeue per port; distinct ports are fully
//! independent.

pub mod dump;
pub mod error;
pub mod packet;
pub mod policies;
pub mod policy;
pub mod port;
pub mod queue;
pub mod registry;
pub mod scheduler;
pub mod wire;

/// Queues a single port can hold.
pub const MAX_QUEUES: usize = 16;

/// Longest port, queue, or policy name in bytes; longer names are truncated.
pub const NAME_MAX: usize = 32;

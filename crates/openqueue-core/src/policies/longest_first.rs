//! Longest-packet-first over a single bounded queue.
//!
//! Admission is keyed by the ToS byte, so congestion evictions shed from the
//! highest-ToS bucket first; processing is keyed by packet length, so the
//! longest resident packet is always transmitted next.

use std::sync::Arc;

use serde::Deserialize;

use crate::error::SchedError;
use crate::packet::PacketRef;
use crate::policy::{CongestionAction, Policy};
use crate::port::{Port, PortBuilder};
use crate::queue::DualIndexQueue;

/// Registry name.
pub const NAME: &str = "longest_first";

/// Queue geometry and congestion threshold.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LongestFirstConfig {
    /// Queue capacity in packets.
    pub capacity: i32,
    /// Length at which the queue counts as congested.
    pub congestion_threshold: i32,
}

impl Default for LongestFirstConfig {
    fn default() -> Self {
        LongestFirstConfig {
            capacity: 1024,
            congestion_threshold: 1024,
        }
    }
}

/// The policy callbacks.
pub struct LongestFirst {
    cfg: LongestFirstConfig,
}

impl LongestFirst {
    pub fn new(cfg: LongestFirstConfig) -> Self {
        LongestFirst { cfg }
    }
}

impl Policy for LongestFirst {
    fn select(&self, _port: &Port, _pkt: PacketRef) -> usize {
        0
    }

    fn congested(&self, queue: &DualIndexQueue) -> bool {
        queue.len() >= self.cfg.congestion_threshold
    }

    fn on_congestion(&self, _queue: &DualIndexQueue, _pkt: PacketRef) -> CongestionAction {
        CongestionAction::DropTail
    }

    fn admission_key(&self, _queue: &DualIndexQueue, pkt: PacketRef) -> u64 {
        u64::from(pkt.tos)
    }

    fn processing_key(&self, _queue: &DualIndexQueue, pkt: PacketRef) -> u64 {
        u64::from(pkt.len)
    }

    fn schedule(&self, _port: &Port) -> usize {
        0
    }
}

/// `init_port` with the default geometry.
pub fn init_port(builder: &mut PortBuilder) -> Result<(), SchedError> {
    init_port_with(builder, LongestFirstConfig::default())
}

/// `init_port` with explicit tuning.
pub fn init_port_with(
    builder: &mut PortBuilder,
    cfg: LongestFirstConfig,
) -> Result<(), SchedError> {
    builder.set_name("longest-first");
    builder.add_queue("q0", cfg.capacity)?;
    builder.set_policy(Arc::new(LongestFirst::new(cfg)));
    Ok(())
}

//! Two-band ToS classifier.
//!
//! Packets at or above the ToS floor land in a small expedited band that is
//! always served first; everything else goes to a deep bulk band. Under
//! congestion the expedited band evicts at its admission tail to make room,
//! while the bulk band drops the arrival.

use std::sync::Arc;

use serde::Deserialize;

use crate::error::SchedError;
use crate::packet::PacketRef;
use crate::policy::{CongestionAction, Policy};
use crate::port::{Port, PortBuilder};
use crate::queue::DualIndexQueue;

/// Registry name.
pub const NAME: &str = "tos_bands";

/// Band geometry and classification floor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TosBandsConfig {
    /// ToS value at or above which a packet is expedited. Defaults to the
    /// EF DSCP codepoint.
    pub tos_floor: u8,
    /// Expedited band capacity in packets.
    pub expedited_capacity: i32,
    /// Bulk band capacity in packets.
    pub bulk_capacity: i32,
}

impl Default for TosBandsConfig {
    fn default() -> Self {
        TosBandsConfig {
            tos_floor: 0xb8,
            expedited_capacity: 128,
            bulk_capacity: 1024,
        }
    }
}

/// The policy callbacks.
pub struct TosBands {
    cfg: TosBandsConfig,
}

impl TosBands {
    pub fn new(cfg: TosBandsConfig) -> Self {
        TosBands { cfg }
    }
}

impl Policy for TosBands {
    fn select(&self, _port: &Port, pkt: PacketRef) -> usize {
        if pkt.tos >= self.cfg.tos_floor {
            0
        } else {
            1
        }
    }

    fn congested(&self, queue: &DualIndexQueue) -> bool {
        queue.len() >= queue.capacity()
    }

    fn on_congestion(&self, queue: &DualIndexQueue, _pkt: PacketRef) -> CongestionAction {
        match queue.name() {
            "expedited" => CongestionAction::DropTail,
            _ => CongestionAction::DropIncoming,
        }
    }

    fn admission_key(&self, _queue: &DualIndexQueue, pkt: PacketRef) -> u64 {
        u64::from(pkt.tos)
    }

    fn processing_key(&self, _queue: &DualIndexQueue, pkt: PacketRef) -> u64 {
        u64::from(pkt.len)
    }

    fn schedule(&self, port: &Port) -> usize {
        // First band with traffic; past the end means nothing to send.
        port.queues()
            .iter()
            .position(|q| !q.is_empty())
            .unwrap_or(port.num_queues())
    }
}

/// `init_port` with the default geometry.
pub fn init_port(builder: &mut PortBuilder) -> Result<(), SchedError> {
    init_port_with(builder, TosBandsConfig::default())
}

/// `init_port` with explicit tuning.
pub fn init_port_with(builder: &mut PortBuilder, cfg: TosBandsConfig) -> Result<(), SchedError> {
    builder.set_name("tos-bands");
    builder.add_queue("expedited", cfg.expedited_capacity)?;
    builder.add_queue("bulk", cfg.bulk_capacity)?;
    builder.set_policy(Arc::new(TosBands::new(cfg)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{ReleaseFn, Scheduler};

    fn noop_release() -> ReleaseFn {
        Box::new(|_| {})
    }

    fn small_bands() -> Scheduler {
        let mut b = PortBuilder::new();
        init_port_with(
            &mut b,
            TosBandsConfig {
                tos_floor: 0xb8,
                expedited_capacity: 2,
                bulk_capacity: 2,
            },
        )
        .unwrap();
        Scheduler::new(b.finish().unwrap(), noop_release())
    }

    #[test]
    fn classifies_by_tos_floor() {
        let mut s = small_bands();
        s.enqueue(PacketRef::new(1).with_tos(0xb8).with_len(100)).unwrap();
        s.enqueue(PacketRef::new(2).with_tos(0x00).with_len(100)).unwrap();

        let dump = s.dump();
        assert_eq!(dump.queues[0].len, 1);
        assert_eq!(dump.queues[1].len, 1);
    }

    #[test]
    fn expedited_band_drains_first() {
        let mut s = small_bands();
        s.enqueue(PacketRef::new(1).with_tos(0).with_len(900)).unwrap();
        s.enqueue(PacketRef::new(2).with_tos(0xff).with_len(100)).unwrap();

        // The short expedited packet beats the long bulk one.
        assert_eq!(s.dequeue().unwrap().map(|p| p.token), Some(2));
        assert_eq!(s.dequeue().unwrap().map(|p| p.token), Some(1));
        assert_eq!(s.dequeue().unwrap(), None);
    }

    #[test]
    fn bulk_band_drops_arrivals_when_full() {
        let mut s = small_bands();
        s.enqueue(PacketRef::new(1).with_tos(0).with_len(100)).unwrap();
        s.enqueue(PacketRef::new(2).with_tos(0).with_len(100)).unwrap();
        s.enqueue(PacketRef::new(3).with_tos(0).with_len(100)).unwrap();

        let dump = s.dump();
        assert_eq!(dump.queues[1].len, 2);
        assert_eq!(dump.queues[1].dropped, 1);
        assert_eq!(dump.queues[1].total, 2);
    }

    #[test]
    fn expedited_band_evicts_to_admit() {
        let mut s = small_bands();
        s.enqueue(PacketRef::new(1).with_tos(0xb8).with_len(100)).unwrap();
        s.enqueue(PacketRef::new(2).with_tos(0xc0).with_len(100)).unwrap();
        s.enqueue(PacketRef::new(3).with_tos(0xba).with_len(100)).unwrap();

        let dump = s.dump();
        assert_eq!(dump.queues[0].len, 2);
        assert_eq!(dump.queues[0].dropped, 1);
        assert_eq!(dump.queues[0].total, 3);
    }
}

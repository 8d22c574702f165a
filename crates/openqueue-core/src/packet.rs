//! Opaque descriptors for externally owned packets.
//!
//! The core neither parses nor mutates packet buffers. A [`PacketRef`]
//! stands in for a buffer the collaborator owns; the same descriptor that
//! went in comes back out on dequeue, or through the release callback on a
//! drop.

/// Descriptor for an externally owned packet.
///
/// Identity is the collaborator-assigned `token`: a pool key, a buffer
/// address, whatever maps one-to-one onto the underlying buffer. `len` and
/// `tos` are carried verbatim for policies that key on them; the core itself
/// reads neither.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketRef {
    /// Collaborator-assigned identity.
    pub token: u64,
    /// Wire length in bytes.
    pub len: u32,
    /// IP ToS/DSCP byte, zero if the collaborator supplied none.
    pub tos: u8,
}

impl PacketRef {
    /// Descriptor with metadata zeroed; identity only.
    pub fn new(token: u64) -> Self {
        PacketRef {
            token,
            len: 0,
            tos: 0,
        }
    }

    pub fn with_len(mut self, len: u32) -> Self {
        self.len = len;
        self
    }

    pub fn with_tos(mut self, tos: u8) -> Self {
        self.tos = tos;
        self
    }
}

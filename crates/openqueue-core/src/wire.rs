//! # Transport Record
//!
//! The fixed-width record carried opaquely between the scheduler and its
//! configuration/inspection collaborator. On the way in only the port-name
//! field is meaningful (it names the policy to bind); on the way out every
//! field is a counter snapshot.
//!
//! ```text
//! offset  size  field
//! 0       33    port_name, NUL-padded
//! 33      49    queue slot 0: name[33], max_len, len, dropped, total
//! ...           ... 16 slots total ...
//! 817     4     num_q
//! ```
//!
//! All integers are little-endian `i32`. Names longer than 32 bytes are
//! truncated.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use compact_str::CompactString;

use crate::dump::{PortDump, QueueDump};
use crate::{MAX_QUEUES, NAME_MAX};

/// Bytes per name field: 32 plus the NUL terminator.
const NAME_FIELD: usize = NAME_MAX + 1;

/// Bytes per queue slot.
const QUEUE_SLOT: usize = NAME_FIELD + 4 * 4;

/// Total record length.
pub const RECORD_LEN: usize = NAME_FIELD + MAX_QUEUES * QUEUE_SLOT + 4;

fn put_name(buf: &mut BytesMut, name: &str) {
    let raw = name.as_bytes();
    let take = raw.len().min(NAME_MAX);
    buf.put_slice(&raw[..take]);
    buf.put_bytes(0, NAME_FIELD - take);
}

fn get_name(buf: &mut &[u8]) -> CompactString {
    let mut raw = [0u8; NAME_FIELD];
    buf.copy_to_slice(&mut raw);
    let end = raw.iter().position(|&b| b == 0).unwrap_or(NAME_FIELD);
    CompactString::from(String::from_utf8_lossy(&raw[..end]))
}

/// Encode a counter snapshot into the fixed-width record.
pub fn encode_dump(dump: &PortDump) -> Bytes {
    let mut buf = BytesMut::with_capacity(RECORD_LEN);
    put_name(&mut buf, &dump.port_name);
    for i in 0..MAX_QUEUES {
        match dump.queues.get(i) {
            Some(q) => {
                put_name(&mut buf, &q.name);
                buf.put_i32_le(q.max_len);
                buf.put_i32_le(q.len);
                buf.put_i32_le(q.dropped);
                buf.put_i32_le(q.total);
            }
            None => buf.put_bytes(0, QUEUE_SLOT),
        }
    }
    buf.put_i32_le(dump.queues.len() as i32);
    buf.freeze()
}

/// Decode a record. `None` if the buffer is short or the queue count is out
/// of range.
pub fn decode_dump(record: &[u8]) -> Option<PortDump> {
    if record.len() < RECORD_LEN {
        return None;
    }
    let mut buf = record;

    let port_name = get_name(&mut buf);
    let mut slots = Vec::with_capacity(MAX_QUEUES);
    for _ in 0..MAX_QUEUES {
        let name = get_name(&mut buf);
        slots.push(QueueDump {
            name,
            max_len: buf.get_i32_le(),
            len: buf.get_i32_le(),
            dropped: buf.get_i32_le(),
            total: buf.get_i32_le(),
        });
    }
    let num_q = buf.get_i32_le();
    if !(0..=MAX_QUEUES as i32).contains(&num_q) {
        return None;
    }
    slots.truncate(num_q as usize);

    Some(PortDump {
        port_name,
        queues: slots,
    })
}

/// Encode a configuration request: the policy name, rest zeroed.
pub fn encode_config(policy_name: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(RECORD_LEN);
    put_name(&mut buf, policy_name);
    buf.put_bytes(0, RECORD_LEN - NAME_FIELD);
    buf.freeze()
}

/// Extract the policy name from a configuration record.
pub fn decode_config(record: &[u8]) -> Option<CompactString> {
    if record.len() < NAME_FIELD {
        return None;
    }
    let mut buf = record;
    Some(get_name(&mut buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_survives_the_record() {
        let dump = PortDump {
            port_name: "uplink".into(),
            queues: vec![
                QueueDump {
                    name: "expedited".into(),
                    max_len: 128,
                    len: 5,
                    dropped: 2,
                    total: 77,
                },
                QueueDump {
                    name: "bulk".into(),
                    max_len: 1024,
                    len: 400,
                    dropped: 0,
                    total: 31_000,
                },
            ],
        };

        let record = encode_dump(&dump);
        assert_eq!(record.len(), RECORD_LEN);
        assert_eq!(decode_dump(&record), Some(dump));
    }

    #[test]
    fn config_record_carries_the_policy_name() {
        let record = encode_config("tos_bands");
        assert_eq!(record.len(), RECORD_LEN);
        assert_eq!(decode_config(&record).unwrap(), "tos_bands");
    }

    #[test]
    fn names_truncate_at_thirty_two_bytes() {
        let long = "q".repeat(64);
        let record = encode_config(&long);
        assert_eq!(decode_config(&record).unwrap(), "q".repeat(32).as_str());
    }

    #[test]
    fn short_buffers_are_rejected() {
        assert_eq!(decode_dump(&[0u8; 10]), None);
        assert_eq!(decode_config(&[0u8; 10]), None);
    }
}

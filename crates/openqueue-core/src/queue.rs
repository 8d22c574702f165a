//! # Dual-Index Queue
//!
//! One logical queue of packets indexed twice: once by admission key, which
//! orders packets for eviction under congestion, and once by processing key,
//! which orders packets for transmission. The two orders are independent, so
//! a port can serve packets in a different order than it accepted them while
//! still dropping them consistently from both views.
//!
//! Entries live in a slab arena; each enqueued packet owns two entries, one
//! per index tree, cross-linked by arena index so the sibling is found in
//! O(1). Within a tree, entries sharing a key form a FIFO bucket; the bucket
//! is removed from its tree the moment it empties. A packet → entry-pair map
//! makes targeted removal independent of key knowledge.
//!
//! The queue does not enforce its own capacity; that is the scheduler's job,
//! through the policy's congestion callback. What the queue does bound is
//! its entry arena, sized for `capacity` packets: exhaustion reports
//! [`SchedError::NoMemory`] with the queue untouched.

use std::collections::{BTreeMap, HashMap, VecDeque};

use compact_str::CompactString;
use slab::Slab;

use crate::error::SchedError;
use crate::packet::PacketRef;
use crate::port::truncate_name;

// ─── Entries and buckets ────────────────────────────────────────────────────

/// One index-tree entry. Every packet owns two, cross-linked via `sibling`.
#[derive(Debug)]
struct Entry {
    packet: PacketRef,
    /// Key this entry is filed under in its own tree.
    key: u64,
    /// Key of the sibling entry in the other tree.
    other_key: u64,
    /// Arena index of the sibling entry.
    sibling: usize,
}

/// FIFO bucket of arena indices sharing one key. Head is the oldest
/// insertion.
type KeyBucket = VecDeque<usize>;

/// Which index tree an operation walks.
#[derive(Clone, Copy)]
enum Tree {
    Admission,
    Processing,
}

/// Detach `idx` from the bucket stored under `key`, dropping the bucket if it
/// empties.
fn detach_index(
    tree: &mut BTreeMap<u64, KeyBucket>,
    key: u64,
    idx: usize,
) -> Result<(), SchedError> {
    let bucket = tree
        .get_mut(&key)
        .ok_or(SchedError::Invariant("sibling bucket missing"))?;
    let pos = bucket
        .iter()
        .position(|&i| i == idx)
        .ok_or(SchedError::Invariant("sibling not in bucket"))?;
    bucket.remove(pos);
    if bucket.is_empty() {
        tree.remove(&key);
    }
    Ok(())
}

// ─── DualIndexQueue ─────────────────────────────────────────────────────────

/// A bounded queue of packets indexed by admission key and processing key at
/// the same time.
#[derive(Debug)]
pub struct DualIndexQueue {
    name: CompactString,
    capacity: i32,
    admission: BTreeMap<u64, KeyBucket>,
    processing: BTreeMap<u64, KeyBucket>,
    entries: Slab<Entry>,
    /// Packet → (admission entry, processing entry) arena indices.
    handles: HashMap<PacketRef, (usize, usize)>,
    /// Hard bound on arena slots; exhaustion reports `NoMemory`.
    max_entries: usize,
    len: i32,
    dropped: i32,
    total: i32,
}

impl DualIndexQueue {
    /// Create a queue for up to `capacity` packets. The name is truncated at
    /// 32 bytes; the entry arena pre-allocates two slots per packet.
    pub fn new(name: &str, capacity: i32) -> Self {
        let max_entries = capacity.max(0) as usize * 2;
        DualIndexQueue {
            name: truncate_name(name),
            capacity,
            admission: BTreeMap::new(),
            processing: BTreeMap::new(),
            entries: Slab::with_capacity(max_entries),
            handles: HashMap::new(),
            max_entries,
            len: 0,
            dropped: 0,
            total: 0,
        }
    }

    /// Index the packet under both keys.
    ///
    /// All-or-nothing: if the entry arena cannot hold two more entries, the
    /// queue is left unchanged and `NoMemory` is returned. Inserting a packet
    /// that is already present is a caller error the queue does not detect.
    pub fn insert(
        &mut self,
        pkt: PacketRef,
        admission_key: u64,
        processing_key: u64,
    ) -> Result<(), SchedError> {
        if self.entries.len() + 2 > self.max_entries {
            return Err(SchedError::NoMemory);
        }

        let a_idx = self.entries.insert(Entry {
            packet: pkt,
            key: admission_key,
            other_key: processing_key,
            sibling: 0,
        });
        let p_idx = self.entries.insert(Entry {
            packet: pkt,
            key: processing_key,
            other_key: admission_key,
            sibling: a_idx,
        });
        self.entries[a_idx].sibling = p_idx;

        self.admission.entry(admission_key).or_default().push_back(a_idx);
        self.processing
            .entry(processing_key)
            .or_default()
            .push_back(p_idx);
        self.handles.insert(pkt, (a_idx, p_idx));

        self.len = self.len.saturating_add(1);
        self.total = self.total.saturating_add(1);
        Ok(())
    }

    /// Release the packet with the largest processing key; FIFO within the
    /// key. `None` when the queue is empty.
    pub fn pop_by_processing(&mut self) -> Result<Option<PacketRef>, SchedError> {
        self.pop_extreme(Tree::Processing, true)
    }

    /// Release the packet with the largest admission key (the drop-tail
    /// victim); FIFO within the key.
    pub fn pop_by_admission_tail(&mut self) -> Result<Option<PacketRef>, SchedError> {
        self.pop_extreme(Tree::Admission, true)
    }

    /// Release the packet with the smallest admission key (the drop-head
    /// victim); FIFO within the key.
    pub fn pop_by_admission_head(&mut self) -> Result<Option<PacketRef>, SchedError> {
        self.pop_extreme(Tree::Admission, false)
    }

    fn pop_extreme(&mut self, tree: Tree, largest: bool) -> Result<Option<PacketRef>, SchedError> {
        let (own, other) = match tree {
            Tree::Admission => (&mut self.admission, &mut self.processing),
            Tree::Processing => (&mut self.processing, &mut self.admission),
        };

        let bucket = if largest { own.last_entry() } else { own.first_entry() };
        let Some(mut bucket) = bucket else {
            return Ok(None);
        };
        let own_idx = bucket
            .get_mut()
            .pop_front()
            .ok_or(SchedError::Invariant("empty key bucket"))?;
        if bucket.get().is_empty() {
            bucket.remove();
        }

        let entry = self
            .entries
            .try_remove(own_idx)
            .ok_or(SchedError::Invariant("entry missing from arena"))?;
        let sibling = self
            .entries
            .try_remove(entry.sibling)
            .ok_or(SchedError::Invariant("sibling missing from arena"))?;
        if sibling.packet != entry.packet {
            return Err(SchedError::Invariant("sibling packet mismatch"));
        }

        detach_index(other, sibling.key, entry.sibling)?;
        self.handles.remove(&entry.packet);
        self.len -= 1;
        Ok(Some(entry.packet))
    }

    /// Detach a specific packet from both views. Returns `false` if the
    /// packet is not present. O(L) in each bucket's length.
    pub fn remove_specific(&mut self, pkt: PacketRef) -> Result<bool, SchedError> {
        let Some((a_idx, p_idx)) = self.handles.remove(&pkt) else {
            return Ok(false);
        };

        let a_entry = self
            .entries
            .try_remove(a_idx)
            .ok_or(SchedError::Invariant("entry missing from arena"))?;
        let p_entry = self
            .entries
            .try_remove(p_idx)
            .ok_or(SchedError::Invariant("sibling missing from arena"))?;

        detach_index(&mut self.admission, a_entry.key, a_idx)?;
        detach_index(&mut self.processing, p_entry.key, p_idx)?;
        self.len -= 1;
        Ok(true)
    }

    /// Remove every packet, handing each to `release` exactly once, and zero
    /// all counters.
    pub fn reset(&mut self, release: &mut dyn FnMut(PacketRef)) {
        for (pkt, _) in self.handles.drain() {
            release(pkt);
        }
        self.admission.clear();
        self.processing.clear();
        self.entries.clear();
        self.len = 0;
        self.dropped = 0;
        self.total = 0;
    }

    /// Count one dropped packet. Saturates at `i32::MAX`.
    pub fn note_drop(&mut self) {
        self.dropped = self.dropped.saturating_add(1);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured capacity in packets.
    pub fn capacity(&self) -> i32 {
        self.capacity
    }

    /// Packets currently held.
    pub fn len(&self) -> i32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Packets dropped over the queue's lifetime.
    pub fn dropped(&self) -> i32 {
        self.dropped
    }

    /// Packets admitted over the queue's lifetime.
    pub fn total_admitted(&self) -> i32 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkt(token: u64) -> PacketRef {
        PacketRef::new(token)
    }

    /// Full structural check: lengths agree, no empty buckets, every entry's
    /// sibling mirrors it from the other tree.
    fn assert_consistent(q: &DualIndexQueue) {
        assert_eq!(q.entries.len(), 2 * q.len as usize);
        assert_eq!(q.handles.len(), q.len as usize);

        for (own, other) in [
            (&q.admission, &q.processing),
            (&q.processing, &q.admission),
        ] {
            let mut seen = 0usize;
            for (key, bucket) in own {
                assert!(!bucket.is_empty(), "empty bucket under key {key}");
                seen += bucket.len();
                for &idx in bucket {
                    let e = &q.entries[idx];
                    assert_eq!(e.key, *key);
                    let sib = &q.entries[e.sibling];
                    assert_eq!(sib.packet, e.packet);
                    assert_eq!(sib.key, e.other_key);
                    assert_eq!(sib.other_key, e.key);
                    assert_eq!(sib.sibling, idx);
                    assert!(
                        other.get(&sib.key).is_some_and(|b| b.contains(&e.sibling)),
                        "sibling of {idx} not filed in the other tree"
                    );
                }
            }
            assert_eq!(seen, q.len as usize);
        }
    }

    #[test]
    fn pop_by_processing_takes_largest_key() {
        let mut q = DualIndexQueue::new("q0", 8);
        q.insert(pkt(1), 1, 10).unwrap();
        q.insert(pkt(2), 2, 20).unwrap();
        q.insert(pkt(3), 3, 30).unwrap();
        assert_consistent(&q);

        assert_eq!(q.pop_by_processing().unwrap(), Some(pkt(3)));
        assert_eq!(q.pop_by_processing().unwrap(), Some(pkt(2)));
        assert_eq!(q.pop_by_processing().unwrap(), Some(pkt(1)));
        assert_eq!(q.pop_by_processing().unwrap(), None);
        assert_eq!(q.len(), 0);
        assert_eq!(q.total_admitted(), 3);
        assert_consistent(&q);
    }

    #[test]
    fn processing_ties_break_fifo() {
        let mut q = DualIndexQueue::new("q0", 8);
        q.insert(pkt(10), 1, 5).unwrap();
        q.insert(pkt(20), 2, 5).unwrap();
        q.insert(pkt(30), 3, 5).unwrap();

        assert_eq!(q.pop_by_processing().unwrap(), Some(pkt(10)));
        assert_eq!(q.pop_by_processing().unwrap(), Some(pkt(20)));
        assert_eq!(q.pop_by_processing().unwrap(), Some(pkt(30)));
    }

    #[test]
    fn admission_tail_takes_largest_admission_key() {
        let mut q = DualIndexQueue::new("q0", 8);
        q.insert(pkt(1), 1, 100).unwrap();
        q.insert(pkt(2), 9, 50).unwrap();
        q.insert(pkt(3), 9, 75).unwrap();

        // Largest admission key is 9; its bucket head is the earlier insert.
        assert_eq!(q.pop_by_admission_tail().unwrap(), Some(pkt(2)));
        assert_eq!(q.pop_by_admission_tail().unwrap(), Some(pkt(3)));
        assert_eq!(q.pop_by_admission_tail().unwrap(), Some(pkt(1)));
        assert_consistent(&q);
    }

    #[test]
    fn admission_head_takes_smallest_admission_key() {
        let mut q = DualIndexQueue::new("q0", 8);
        q.insert(pkt(1), 4, 1).unwrap();
        q.insert(pkt(2), 2, 2).unwrap();
        q.insert(pkt(3), 7, 3).unwrap();

        assert_eq!(q.pop_by_admission_head().unwrap(), Some(pkt(2)));
        assert_eq!(q.pop_by_admission_head().unwrap(), Some(pkt(1)));
        assert_eq!(q.pop_by_admission_head().unwrap(), Some(pkt(3)));
    }

    #[test]
    fn cross_view_removal_stays_consistent() {
        let mut q = DualIndexQueue::new("q0", 8);
        // Shared admission bucket, distinct processing keys.
        q.insert(pkt(1), 5, 10).unwrap();
        q.insert(pkt(2), 5, 30).unwrap();
        q.insert(pkt(3), 5, 20).unwrap();

        // Popping by processing must splice the middle of the admission
        // bucket, not its head.
        assert_eq!(q.pop_by_processing().unwrap(), Some(pkt(2)));
        assert_consistent(&q);
        assert_eq!(q.pop_by_admission_tail().unwrap(), Some(pkt(1)));
        assert_consistent(&q);
    }

    #[test]
    fn remove_specific_detaches_both_views() {
        let mut q = DualIndexQueue::new("q0", 8);
        q.insert(pkt(1), 1, 10).unwrap();
        q.insert(pkt(2), 1, 20).unwrap();
        q.insert(pkt(3), 2, 20).unwrap();

        assert!(q.remove_specific(pkt(2)).unwrap());
        assert_eq!(q.len(), 2);
        assert_consistent(&q);

        // Gone from both orders.
        assert_eq!(q.pop_by_processing().unwrap(), Some(pkt(3)));
        assert_eq!(q.pop_by_processing().unwrap(), Some(pkt(1)));
    }

    #[test]
    fn remove_specific_absent_is_false() {
        let mut q = DualIndexQueue::new("q0", 8);
        q.insert(pkt(1), 1, 1).unwrap();
        assert!(!q.remove_specific(pkt(99)).unwrap());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn arena_bound_reports_no_memory() {
        let mut q = DualIndexQueue::new("q0", 1);
        q.insert(pkt(1), 1, 1).unwrap();
        assert_eq!(q.insert(pkt(2), 2, 2), Err(SchedError::NoMemory));
        // All-or-nothing: nothing changed.
        assert_eq!(q.len(), 1);
        assert_eq!(q.total_admitted(), 1);
        assert_consistent(&q);
    }

    #[test]
    fn counters_saturate() {
        let mut q = DualIndexQueue::new("q0", 8);
        q.total = i32::MAX;
        q.dropped = i32::MAX;
        q.insert(pkt(1), 1, 1).unwrap();
        q.note_drop();
        assert_eq!(q.total_admitted(), i32::MAX);
        assert_eq!(q.dropped(), i32::MAX);
    }

    #[test]
    fn reset_releases_each_packet_once() {
        let mut q = DualIndexQueue::new("q0", 8);
        for t in 0..5 {
            q.insert(pkt(t), t, t).unwrap();
        }
        q.note_drop();

        let mut released = Vec::new();
        q.reset(&mut |p| released.push(p.token));
        released.sort_unstable();
        assert_eq!(released, vec![0, 1, 2, 3, 4]);
        assert_eq!(q.len(), 0);
        assert_eq!(q.dropped(), 0);
        assert_eq!(q.total_admitted(), 0);
        assert_consistent(&q);
    }

    #[test]
    fn name_is_truncated() {
        let q = DualIndexQueue::new("a-queue-name-well-past-thirty-two-bytes", 1);
        assert_eq!(q.name().len(), 32);
    }
}

//! Circular Fault-Event Log
//!
//! Fixed slots inside one CRC-protected block. A slot is four bytes: a
//! 24-bit timestamp in engine-hours periods and a one-byte event code,
//! where code 0 marks the slot empty. When the log is full the event with
//! the lowest timestamp is evicted, so the log always holds the most
//! recent faults. A region that fails its CRC reads as an empty log; one
//! flipped bit must never resurrect ghost faults.

use heapless::Vec;

use crate::constants::storage::{
    EVENT_CAPACITY, EVENT_REGION_LEN, EVENT_REGION_OFFSET, EVENT_SLOT_LEN, EVENT_TIMESTAMP_MAX,
};
use crate::errors::StorageResult;

use super::backend::NvBackend;
use super::block::{read_u24_le, write_u24_le, BlockStore, CRC_LEN};

const PAYLOAD_LEN: usize = EVENT_REGION_LEN - CRC_LEN;
const CODE_OFFSET: usize = 3;

/// Slot code marking an empty slot.
pub const EVENT_EMPTY: u8 = 0;

/// A bounded batch of stored events.
pub type EventList = Vec<EventRecord, EVENT_CAPACITY>;

/// One logged fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventRecord {
    /// Engine-hours periods at the time of the fault (24-bit).
    pub timestamp: u32,
    /// Event code; never [`EVENT_EMPTY`].
    pub code: u8,
}

fn slot(payload: &[u8], index: usize) -> (u32, u8) {
    let at = index * EVENT_SLOT_LEN;
    (read_u24_le(payload, at), payload[at + CODE_OFFSET])
}

impl<B: NvBackend> BlockStore<B> {
    /// The event region payload, or all-empty when the CRC fails.
    fn load_events(&self) -> StorageResult<[u8; PAYLOAD_LEN]> {
        let mut payload = [0u8; PAYLOAD_LEN];
        if !self.load_block(EVENT_REGION_OFFSET, &mut payload)? {
            log_warn!("event region failed CRC, reading as empty");
            payload = [0u8; PAYLOAD_LEN];
        }
        Ok(payload)
    }

    /// Append a fault. With all slots occupied, the oldest event makes
    /// room. A `code` of [`EVENT_EMPTY`] is ignored.
    pub fn record_event(&mut self, code: u8, timestamp: u32) -> StorageResult<()> {
        if code == EVENT_EMPTY {
            return Ok(());
        }
        let mut payload = self.load_events()?;

        let mut target = 0;
        let mut oldest = u32::MAX;
        for i in 0..EVENT_CAPACITY {
            let (ts, slot_code) = slot(&payload, i);
            if slot_code == EVENT_EMPTY {
                target = i;
                break;
            }
            if ts < oldest {
                oldest = ts;
                target = i;
            }
        }

        let at = target * EVENT_SLOT_LEN;
        write_u24_le(&mut payload, at, timestamp.min(EVENT_TIMESTAMP_MAX));
        payload[at + CODE_OFFSET] = code;
        self.store_block(EVENT_REGION_OFFSET, &payload)
    }

    /// The stored event with the lowest timestamp strictly greater than
    /// `after` (or the overall lowest when `after` is `None`). Repeated
    /// calls walk the log oldest-first.
    pub fn next_event(&self, after: Option<u32>) -> StorageResult<Option<EventRecord>> {
        let payload = self.load_events()?;

        let mut best: Option<EventRecord> = None;
        for i in 0..EVENT_CAPACITY {
            let (ts, code) = slot(&payload, i);
            if code == EVENT_EMPTY {
                continue;
            }
            if let Some(floor) = after {
                if ts <= floor {
                    continue;
                }
            }
            if best.map_or(true, |b| ts < b.timestamp) {
                best = Some(EventRecord {
                    timestamp: ts,
                    code,
                });
            }
        }
        Ok(best)
    }

    /// All stored events newer than `after`, oldest first.
    pub fn events_since(&self, after: Option<u32>) -> StorageResult<EventList> {
        let payload = self.load_events()?;

        let mut events = EventList::new();
        for i in 0..EVENT_CAPACITY {
            let (ts, code) = slot(&payload, i);
            if code == EVENT_EMPTY || after.map_or(false, |floor| ts <= floor) {
                continue;
            }
            // Capacity equals the slot count, cannot overflow
            let _ = events.push(EventRecord {
                timestamp: ts,
                code,
            });
        }
        events.sort_unstable_by_key(|e| e.timestamp);
        Ok(events)
    }

    /// Number of occupied slots.
    pub fn count_events(&self) -> StorageResult<usize> {
        let payload = self.load_events()?;
        Ok((0..EVENT_CAPACITY)
            .filter(|&i| slot(&payload, i).1 != EVENT_EMPTY)
            .count())
    }

    /// Erase the log.
    pub fn clear_events(&mut self) -> StorageResult<()> {
        self.store_block(EVENT_REGION_OFFSET, &[0u8; PAYLOAD_LEN])
    }
}

#[cfg(test)]
mod tests {
    use super::super::backend::MemoryBackend;
    use super::*;
    use crate::constants::storage::NV_MIN_SIZE;

    type TestStore = BlockStore<MemoryBackend<NV_MIN_SIZE>>;

    fn store() -> TestStore {
        BlockStore::new(MemoryBackend::new())
    }

    #[test]
    fn record_and_walk_oldest_first() {
        let mut store = store();
        store.record_event(3, 300).unwrap();
        store.record_event(1, 100).unwrap();
        store.record_event(2, 200).unwrap();

        let first = store.next_event(None).unwrap().unwrap();
        assert_eq!((first.timestamp, first.code), (100, 1));

        let second = store.next_event(Some(first.timestamp)).unwrap().unwrap();
        assert_eq!((second.timestamp, second.code), (200, 2));

        let third = store.next_event(Some(second.timestamp)).unwrap().unwrap();
        assert_eq!((third.timestamp, third.code), (300, 3));

        assert!(store.next_event(Some(third.timestamp)).unwrap().is_none());
    }

    #[test]
    fn full_log_evicts_oldest() {
        let mut store = store();
        for i in 0..EVENT_CAPACITY as u32 {
            store.record_event(5, 100 + i).unwrap();
        }
        assert_eq!(store.count_events().unwrap(), EVENT_CAPACITY);

        store.record_event(7, 9000).unwrap();

        assert_eq!(store.count_events().unwrap(), EVENT_CAPACITY);
        // 100 was the oldest; 101 is now the head of the walk
        let first = store.next_event(None).unwrap().unwrap();
        assert_eq!(first.timestamp, 101);
        let newest = store.events_since(None).unwrap();
        assert_eq!(newest.last().unwrap().timestamp, 9000);
    }

    #[test]
    fn corrupted_region_reads_empty() {
        let mut store = store();
        store.record_event(4, 42).unwrap();
        assert_eq!(store.count_events().unwrap(), 1);

        store.backend_mut().corrupt(EVENT_REGION_OFFSET + CRC_LEN, 2);

        assert_eq!(store.count_events().unwrap(), 0);
        assert!(store.next_event(None).unwrap().is_none());
    }

    #[test]
    fn clear_empties_the_log() {
        let mut store = store();
        store.record_event(4, 42).unwrap();
        store.clear_events().unwrap();

        assert_eq!(store.count_events().unwrap(), 0);
    }

    #[test]
    fn timestamp_clamped_to_24_bits() {
        let mut store = store();
        store.record_event(9, u32::MAX).unwrap();

        let event = store.next_event(None).unwrap().unwrap();
        assert_eq!(event.timestamp, EVENT_TIMESTAMP_MAX);
    }

    #[test]
    fn empty_code_is_ignored() {
        let mut store = store();
        store.record_event(EVENT_EMPTY, 10).unwrap();
        assert_eq!(store.count_events().unwrap(), 0);
    }

    #[test]
    fn events_since_filters_and_sorts() {
        let mut store = store();
        store.record_event(1, 500).unwrap();
        store.record_event(2, 100).unwrap();
        store.record_event(3, 300).unwrap();

        let events = store.events_since(Some(100)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], EventRecord { timestamp: 300, code: 3 });
        assert_eq!(events[1], EventRecord { timestamp: 500, code: 1 });
    }
}

//! CRC-Protected Block Layer
//!
//! Every persisted region is a block: a little-endian CRC-16 over the
//! payload, then the payload itself. Loading never fails on corruption -
//! it reports validity and the caller substitutes defaults. Storing
//! re-reads each byte first and skips the physical write when the stored
//! byte already matches, which is what keeps the periodic hours save from
//! eating the EEPROM's write endurance.

use crate::errors::{StorageError, StorageResult};

use super::backend::NvBackend;
use super::crc::crc16;

/// Bytes of CRC prefixed to every block.
pub const CRC_LEN: usize = 2;

/// Block-level access to one non-volatile device.
pub struct BlockStore<B: NvBackend> {
    backend: B,
}

impl<B: NvBackend> BlockStore<B> {
    /// Wrap a backend. Capacity checks happen per block access, so any
    /// device works as long as the regions asked of it fit.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// The wrapped backend, for diagnostics.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend, for tests that inject corruption.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn check_bounds(&self, offset: usize, payload_len: usize) -> StorageResult<()> {
        let len = CRC_LEN + payload_len;
        let size = self.backend.size();
        if offset.checked_add(len).map_or(true, |end| end > size) {
            return Err(StorageError::OutOfBounds { offset, len, size });
        }
        Ok(())
    }

    /// Read the block at `offset` into `payload`. Returns whether the
    /// stored CRC matched; on a mismatch `payload` still holds the raw
    /// (untrusted) bytes.
    pub fn load_block(&self, offset: usize, payload: &mut [u8]) -> StorageResult<bool> {
        self.check_bounds(offset, payload.len())?;

        let lo = self.backend.read_byte(offset)?;
        let hi = self.backend.read_byte(offset + 1)?;
        let stored = u16::from_le_bytes([lo, hi]);

        for (i, byte) in payload.iter_mut().enumerate() {
            *byte = self.backend.read_byte(offset + CRC_LEN + i)?;
        }
        Ok(crc16(payload) == stored)
    }

    /// Write `payload` and its CRC at `offset`, skipping bytes that
    /// already hold the right value.
    pub fn store_block(&mut self, offset: usize, payload: &[u8]) -> StorageResult<()> {
        self.check_bounds(offset, payload.len())?;

        let crc = crc16(payload).to_le_bytes();
        self.write_if_changed(offset, crc[0])?;
        self.write_if_changed(offset + 1, crc[1])?;
        for (i, &byte) in payload.iter().enumerate() {
            self.write_if_changed(offset + CRC_LEN + i, byte)?;
        }
        Ok(())
    }

    fn write_if_changed(&mut self, offset: usize, value: u8) -> StorageResult<()> {
        if self.backend.read_byte(offset)? != value {
            self.backend.write_byte(offset, value)?;
        }
        Ok(())
    }
}

/// Decode a little-endian u16 at `at` in a payload.
pub(crate) fn read_u16_le(payload: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([payload[at], payload[at + 1]])
}

/// Encode a little-endian u16 at `at` in a payload.
pub(crate) fn write_u16_le(payload: &mut [u8], at: usize, value: u16) {
    payload[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

/// Decode a little-endian u24 at `at` in a payload.
pub(crate) fn read_u24_le(payload: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([payload[at], payload[at + 1], payload[at + 2], 0])
}

/// Encode the low 24 bits of `value` little-endian at `at` in a payload.
pub(crate) fn write_u24_le(payload: &mut [u8], at: usize, value: u32) {
    let bytes = value.to_le_bytes();
    payload[at..at + 3].copy_from_slice(&bytes[..3]);
}

/// Decode a little-endian u32 at `at` in a payload.
pub(crate) fn read_u32_le(payload: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([
        payload[at],
        payload[at + 1],
        payload[at + 2],
        payload[at + 3],
    ])
}

/// Encode a little-endian u32 at `at` in a payload.
pub(crate) fn write_u32_le(payload: &mut [u8], at: usize, value: u32) {
    payload[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::super::backend::MemoryBackend;
    use super::*;

    #[test]
    fn round_trip_validates() {
        let mut store = BlockStore::new(MemoryBackend::<32>::new());
        let payload = [1u8, 2, 3, 4, 5, 6];

        store.store_block(4, &payload).unwrap();

        let mut read = [0u8; 6];
        assert!(store.load_block(4, &mut read).unwrap());
        assert_eq!(read, payload);
    }

    #[test]
    fn erased_device_fails_validation() {
        // Factory-fresh EEPROM reads all 0xFF; its stored "CRC" of 0xFFFF
        // does not match the CRC of an all-0xFF payload
        let store = BlockStore::new(MemoryBackend::with_content([0xFF; 32]));
        let mut read = [0u8; 6];

        assert!(!store.load_block(0, &mut read).unwrap());
        assert_eq!(read, [0xFF; 6]);
    }

    #[test]
    fn corruption_detected() {
        let mut store = BlockStore::new(MemoryBackend::<32>::new());
        let payload = [9u8, 8, 7, 6];
        store.store_block(0, &payload).unwrap();

        store.backend_mut().corrupt(CRC_LEN + 1, 3);

        let mut read = [0u8; 4];
        assert!(!store.load_block(0, &mut read).unwrap());
    }

    #[test]
    fn unchanged_store_writes_nothing() {
        let mut store = BlockStore::new(MemoryBackend::<32>::new());
        let payload = [0xAAu8; 6];

        store.store_block(0, &payload).unwrap();
        let after_first = store.backend().writes();

        store.store_block(0, &payload).unwrap();
        assert_eq!(store.backend().writes(), after_first);
    }

    #[test]
    fn single_changed_byte_writes_once() {
        let mut store = BlockStore::new(MemoryBackend::<32>::new());
        let mut payload = [0xAAu8; 6];
        store.store_block(0, &payload).unwrap();
        let baseline = store.backend().writes();

        payload[5] = 0xAB;
        store.store_block(0, &payload).unwrap();
        // One payload byte plus however much of the CRC moved
        assert!(store.backend().writes() - baseline <= 3);
    }

    #[test]
    fn oversized_block_rejected() {
        let mut store = BlockStore::new(MemoryBackend::<8>::new());
        let payload = [0u8; 7];

        assert!(matches!(
            store.store_block(0, &payload),
            Err(StorageError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn field_codecs_round_trip() {
        let mut payload = [0u8; 9];
        write_u32_le(&mut payload, 0, 0xDEAD_BEEF);
        write_u24_le(&mut payload, 4, 0x0012_3456);
        write_u16_le(&mut payload, 7, 0xCAFE);

        assert_eq!(read_u32_le(&payload, 0), 0xDEAD_BEEF);
        assert_eq!(read_u24_le(&payload, 4), 0x0012_3456);
        assert_eq!(read_u16_le(&payload, 7), 0xCAFE);
    }
}

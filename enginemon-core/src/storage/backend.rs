//! Non-Volatile Byte Access Seam
//!
//! The board layer provides the actual device (EEPROM, flash-emulated
//! EEPROM, FRAM) behind [`NvBackend`]; the core only ever moves single
//! bytes through it. Byte granularity is deliberate: the block layer skips
//! writes of unchanged bytes, and on wear-limited parts that optimization
//! only works if the backend is not forced to rewrite whole pages.

use crate::errors::{StorageError, StorageResult};

/// Byte-addressed non-volatile storage provided by the board layer.
pub trait NvBackend {
    /// Device capacity in bytes.
    fn size(&self) -> usize;

    /// Read one byte.
    fn read_byte(&self, offset: usize) -> StorageResult<u8>;

    /// Write one byte. The caller has already decided the byte differs
    /// from what is stored; implementations should not re-check.
    fn write_byte(&mut self, offset: usize, value: u8) -> StorageResult<()>;
}

/// In-memory backend for host tests and the demo binary.
///
/// Counts physical writes so tests can assert the unchanged-byte
/// optimization actually suppresses them.
pub struct MemoryBackend<const N: usize> {
    bytes: [u8; N],
    writes: u32,
}

impl<const N: usize> MemoryBackend<N> {
    /// A blank (all-zero) device.
    pub const fn new() -> Self {
        Self {
            bytes: [0; N],
            writes: 0,
        }
    }

    /// A device with preexisting content.
    pub const fn with_content(bytes: [u8; N]) -> Self {
        Self { bytes, writes: 0 }
    }

    /// Physical writes performed since construction.
    pub fn writes(&self) -> u32 {
        self.writes
    }

    /// Flip one bit in place, bypassing the write counter. Test helper for
    /// simulating storage corruption.
    pub fn corrupt(&mut self, offset: usize, bit: u8) {
        self.bytes[offset] ^= 1 << bit;
    }

    /// Raw view of the device content.
    pub fn raw(&self) -> &[u8; N] {
        &self.bytes
    }
}

impl<const N: usize> Default for MemoryBackend<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> NvBackend for MemoryBackend<N> {
    fn size(&self) -> usize {
        N
    }

    fn read_byte(&self, offset: usize) -> StorageResult<u8> {
        self.bytes
            .get(offset)
            .copied()
            .ok_or(StorageError::OutOfBounds {
                offset,
                len: 1,
                size: N,
            })
    }

    fn write_byte(&mut self, offset: usize, value: u8) -> StorageResult<()> {
        let size = N;
        let slot = self
            .bytes
            .get_mut(offset)
            .ok_or(StorageError::OutOfBounds {
                offset,
                len: 1,
                size,
            })?;
        *slot = value;
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_is_an_error() {
        let mut backend = MemoryBackend::<16>::new();

        assert!(backend.read_byte(15).is_ok());
        assert!(matches!(
            backend.read_byte(16),
            Err(StorageError::OutOfBounds { .. })
        ));
        assert!(matches!(
            backend.write_byte(16, 0xFF),
            Err(StorageError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn writes_are_counted() {
        let mut backend = MemoryBackend::<16>::new();
        backend.write_byte(0, 0xAA).unwrap();
        backend.write_byte(1, 0xBB).unwrap();

        assert_eq!(backend.writes(), 2);
        assert_eq!(backend.read_byte(0).unwrap(), 0xAA);
    }
}

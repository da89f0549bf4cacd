//! Error types for sensing and persistence
//!
//! Errors here follow the same rules as the rest of the crate:
//!
//! 1. **Small size**: every variant is a couple of words at most; errors are
//!    returned from the polling hot path and must be cheap to move around.
//!
//! 2. **No heap allocation**: all context is inline, `&'static str` only.
//!
//! 3. **Copy semantics**: callers can stash an error and keep polling.
//!
//! Nothing in this crate treats an error as fatal. A sensor error degrades
//! to a "not available" reading, a storage error degrades to defaults; the
//! control loop keeps running either way.

use thiserror_no_std::Error;

/// Result alias for ADC and calibration operations.
pub type SensorResult<T> = Result<T, SensorError>;

/// Result alias for non-volatile storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Failures while acquiring or calibrating an analog reading.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The ADC reported a conversion failure on this channel.
    #[error("ADC read failed on channel {channel}")]
    AdcFailed {
        /// Channel index as wired on the board
        channel: u8,
    },

    /// The raw code sits in the disconnected-sensor region of the curve.
    #[error("sensor disconnected (code {code})")]
    Disconnected {
        /// Raw ADC code that tripped the disconnect threshold
        code: u16,
    },

    /// Sensor supply rail too low to trust a ratiometric reading.
    #[error("sensor supply below minimum (code {code})")]
    SupplyLow {
        /// Raw ADC code measured on the supply channel
        code: u16,
    },
}

/// Failures in the non-volatile block store.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested block does not fit in the backing device.
    #[error("block {offset}+{len} exceeds device size {size}")]
    OutOfBounds {
        /// Block start offset in bytes
        offset: usize,
        /// Block length in bytes
        len: usize,
        /// Backing device size in bytes
        size: usize,
    },

    /// Block too short to carry its own CRC.
    #[error("block of {len} bytes cannot hold a CRC")]
    BlockTooShort {
        /// Requested block length
        len: usize,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::AdcFailed { channel } => defmt::write!(fmt, "ADC failed on {}", channel),
            Self::Disconnected { code } => defmt::write!(fmt, "disconnected ({})", code),
            Self::SupplyLow { code } => defmt::write!(fmt, "supply low ({})", code),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StorageError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::OutOfBounds { offset, len, size } => {
                defmt::write!(fmt, "block {}+{} exceeds {}", offset, len, size)
            }
            Self::BlockTooShort { len } => defmt::write!(fmt, "block of {} too short", len),
        }
    }
}

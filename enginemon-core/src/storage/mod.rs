//! Non-Volatile State: Config Block and Fault-Event Log
//!
//! ## Overview
//!
//! Two CRC-16 protected regions in a single small device (a 128-byte
//! EEPROM in the reference installation): the configuration block holding
//! the engine-hours accumulator and the ADC reference calibration, and a
//! circular fault-event log. The board supplies the device behind the
//! [`NvBackend`] byte seam; [`BlockStore`] layers CRC framing and
//! write-avoidance on top, and the config/event modules give the typed
//! operations the rest of the crate uses.
//!
//! ## Degradation
//!
//! Corruption is never an error to callers: a config block that fails its
//! CRC decodes as factory defaults and the next periodic save repairs it,
//! and a corrupt event region reads as an empty log. The only hard errors
//! out of this module are bounds problems, which indicate a misconfigured
//! board rather than a bad flight of bits.
//!
//! ## Write Endurance
//!
//! The hours accumulator is saved every accrual period while the engine
//! runs. [`BlockStore`] reads before writing and skips identical bytes, so
//! a save that changes one counter byte costs one physical write. Tests
//! assert on the [`MemoryBackend`] write counter to keep that true.

#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {{}};
}

pub mod backend;
pub mod block;
pub mod config;
pub mod crc;
pub mod events;

pub use backend::{MemoryBackend, NvBackend};
pub use block::BlockStore;
pub use config::EngineConfig;
pub use events::{EventList, EventRecord, EVENT_EMPTY};

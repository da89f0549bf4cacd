//! Non-Volatile Memory Layout
//!
//! Byte-exact layout of the EEPROM image, little-endian throughout:
//!
//! ```text
//! offset 0   u16 crc16            ┐ config block (8 bytes)
//! offset 2   u32 engineHoursPeriods │
//! offset 6   u16 vddScale          ┘
//! offset 8   u16 crc16            ┐ event region (2 + 4*capacity bytes)
//! offset 10  [u24 timestamp, u8 kind] × capacity
//! ```
//!
//! The two CRCs are independent; corrupting one block never invalidates the
//! other. Each CRC covers only the payload bytes of its own block.

/// Offset of the config block.
pub const CONFIG_BLOCK_OFFSET: usize = 0;

/// Config block length including its CRC.
pub const CONFIG_BLOCK_LEN: usize = 8;

/// Offset of the engine-hours counter within the config block payload.
pub const CONFIG_HOURS_OFFSET: usize = 0;

/// Offset of the Vdd scale within the config block payload.
pub const CONFIG_VDD_OFFSET: usize = 4;

/// Stored Vdd scalar when the block is invalid or blank.
///
/// Stored value / 10000 = volts; 46700 is the nominal 4.67V regulator
/// output measured on the reference board.
pub const DEFAULT_VDD_SCALE: u16 = 46_700;

/// Divisor turning the stored Vdd scalar into volts.
pub const VDD_SCALE_DIVISOR: f32 = 10_000.0;

/// Offset of the event log region.
pub const EVENT_REGION_OFFSET: usize = CONFIG_BLOCK_OFFSET + CONFIG_BLOCK_LEN;

/// Bytes per stored event slot.
pub const EVENT_SLOT_LEN: usize = 4;

/// Number of event slots.
///
/// Sized to the 128-byte budget of the smallest supported part:
/// (128 - 8 - 2) / 4 = 29.
pub const EVENT_CAPACITY: usize = 29;

/// Event region length including its CRC.
pub const EVENT_REGION_LEN: usize = 2 + EVENT_SLOT_LEN * EVENT_CAPACITY;

/// Minimum backing-device size this layout requires.
pub const NV_MIN_SIZE: usize = EVENT_REGION_OFFSET + EVENT_REGION_LEN;

/// Largest timestamp that fits the 24-bit event slot field.
pub const EVENT_TIMESTAMP_MAX: u32 = 0x00FF_FFFF;

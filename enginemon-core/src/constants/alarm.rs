//! Alarm Thresholds
//!
//! Hysteresis pairs per monitored quantity. Every pair keeps its set and
//! clear values apart so a reading hovering at the boundary cannot chatter
//! the bit; a set bit releases only after the value crosses the clear
//! threshold.

// ===== ENGINE GATING =====

/// RPM at or below which the engine is considered stopped.
///
/// Deliberately below [`RUNNING_RPM`]: a sagging idle must not flap the
/// running state while the alarm gate has already opened.
pub const SHUTDOWN_RPM: f32 = 200.0;

/// RPM above which `requires_running` alarms are armed.
///
/// Just under the 850rpm idle of the reference engine.
pub const RUNNING_RPM: f32 = 700.0;

// ===== COOLANT =====

/// Coolant over-temperature set threshold (Kelvin). 105°C.
pub const COOLANT_OVER_TEMP_SET_K: f32 = 378.15;

/// Coolant over-temperature clear threshold (Kelvin). 100°C.
pub const COOLANT_OVER_TEMP_CLEAR_K: f32 = 373.15;

// ===== OIL PRESSURE =====

/// Low oil pressure set threshold (Pascal). 100kPa, ~14.5psi.
///
/// Requires the engine running: pressure is legitimately zero at rest.
pub const OIL_PRESSURE_LOW_SET_PA: f32 = 100_000.0;

/// Low oil pressure clear threshold (Pascal). 150kPa.
pub const OIL_PRESSURE_LOW_CLEAR_PA: f32 = 150_000.0;

// ===== SYSTEM VOLTAGE =====

/// Low system voltage set threshold (Volt).
///
/// Requires the engine running: with the alternator spinning, 11.8V means
/// the charge circuit has failed.
pub const VOLTAGE_LOW_SET_V: f32 = 11.8;

/// Low system voltage clear threshold (Volt).
pub const VOLTAGE_LOW_CLEAR_V: f32 = 12.5;

// ===== EXHAUST =====

/// Exhaust over-temperature set threshold (Kelvin). 80°C.
///
/// A wet exhaust running this hot has lost raw-water flow.
pub const EXHAUST_OVER_TEMP_SET_K: f32 = 353.15;

/// Exhaust over-temperature clear threshold (Kelvin). 70°C.
pub const EXHAUST_OVER_TEMP_CLEAR_K: f32 = 343.15;

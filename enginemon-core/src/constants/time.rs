//! Time-Related Constants
//!
//! Cadences for the cooperative main loop. Everything here is compared
//! against the wrapping millisecond clock in [`crate::time`].

// ===== MAIN LOOP CADENCES =====

/// State-machine poll interval (milliseconds).
///
/// The estimator snapshot, alarm evaluation, and transition rules run once
/// per poll. 500ms matches the rapid-engine update cadence of the attached
/// instrument bus; polling faster only re-reads the same capture window.
pub const POLL_INTERVAL_MS: u32 = 500;

// ===== ENGINE HOURS =====

/// Engine-hours accrual tick (milliseconds).
///
/// The persisted counter advances by one per tick while the engine runs.
/// 15s resolution keeps the EEPROM write rate at 4 writes/minute, which at
/// 100k cell endurance gives a device lifetime measured in decades of
/// engine-on time (together with skip-identical-byte writes).
pub const ENGINE_HOURS_TICK_MS: u32 = 15_000;

/// Seconds represented by one engine-hours period.
pub const SECONDS_PER_HOURS_TICK: u32 = 15;

// ===== STARTUP =====

/// Alarm grace period after start (milliseconds).
///
/// Oil pressure and voltage are genuinely out of range while the engine
/// spins up; alarms are computed but not exposed until this much time has
/// passed since the stop-to-run transition.
pub const STARTUP_GRACE_MS: u32 = 15_000;

//! Constants for enginemon-core
//!
//! Centralized, documented deployment constants. All numeric values used by
//! the estimators, the state machine, and the storage layout are defined
//! here with their source and rationale.
//!
//! ## Organization
//!
//! Constants are grouped by domain:
//! - **Time**: poll cadences, grace periods, hours-accrual tick
//! - **Rpm**: pulse geometry, validity windows, capture timer rates
//! - **Storage**: byte layout of the non-volatile memory
//! - **Alarm**: hysteresis threshold pairs per monitored quantity
//!
//! ## Usage Guidelines
//!
//! 1. Always use these constants instead of magic numbers
//! 2. When a value came from a bench calibration, keep the calibration note
//! 3. Values that legitimately differ per installation are duplicated as
//!    fields of the relevant config struct with these as defaults

/// Poll cadences, grace periods, and the engine-hours tick.
pub mod time;

/// Flywheel pulse geometry and measurement-validity windows.
pub mod rpm;

/// Non-volatile memory layout: offsets, lengths, capacities.
pub mod storage;

/// ADC front-end calibration: divider ratios, reference codes, cutoffs.
pub mod sensors;

/// Alarm hysteresis thresholds per monitored quantity.
pub mod alarm;

// Re-export commonly used constants for convenience
pub use time::{ENGINE_HOURS_TICK_MS, POLL_INTERVAL_MS, STARTUP_GRACE_MS};

pub use rpm::{
    DEFAULT_CAPTURE_EDGES, DEFAULT_EDGES_PER_CAPTURE, MAX_PLAUSIBLE_HZ, MIN_PLAUSIBLE_HZ,
    RPM_FACTOR,
};

pub use storage::{
    CONFIG_BLOCK_LEN, CONFIG_BLOCK_OFFSET, EVENT_CAPACITY, EVENT_REGION_LEN, EVENT_REGION_OFFSET,
    NV_MIN_SIZE,
};

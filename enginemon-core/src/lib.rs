//! Core monitoring engine for small marine diesels
//!
//! Flywheel RPM estimation, calibrated analog sensing, hysteresis alarms,
//! and CRC-protected persistence for the hours counter and fault log.
//! The board layer supplies the hardware behind three seams - an ADC, a
//! byte-addressed non-volatile device, and interrupt handlers feeding the
//! shared pulse state - and drives everything from one `poll` per loop.
//!
//! Key constraints:
//! - Runs on 2KB RAM (AVR-class MCU)
//! - No heap allocation anywhere
//! - Interrupt handlers touch only plain-integer shared state
//! - Degrades, never panics: corrupt storage reads as defaults, missing
//!   sensors read as not-available
//!
//! ```no_run
//! use enginemon_core::{
//!     AlarmInputs, ElapsedTimeEstimator, EngineMonitor, MemoryBackend, PulseState, RpmConfig,
//! };
//!
//! static PULSES: PulseState = PulseState::new(10);
//!
//! let estimator = ElapsedTimeEstimator::new(&PULSES, RpmConfig::default());
//! let mut monitor = EngineMonitor::new(estimator, MemoryBackend::<128>::new())?;
//!
//! // Board interrupt handler: PULSES.on_edge(micros());
//! // Main loop:
//! let (now_ms, now_us) = (0, 0);
//! if let Some(outcome) = monitor.poll(now_ms, now_us, &AlarmInputs::NONE)? {
//!     let _ = outcome.rpm;
//! }
//! # Ok::<(), enginemon_core::StorageError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod alarm;
pub mod calibration;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod rpm;
pub mod sensors;
pub mod storage;
pub mod time;

// Public API
pub use alarm::{AlarmInputs, AlarmKind, AlarmSet, Status1, Status2};
pub use engine::{EngineMonitor, EngineState, PollOutcome};
pub use errors::{SensorError, SensorResult, StorageError, StorageResult};
pub use rpm::{
    CaptureConfig, CaptureEstimator, CaptureState, ElapsedTimeEstimator, FrequencyEstimator,
    PulseState, RpmConfig, RpmEstimate,
};
pub use sensors::{Adc, AdcChannel, EngineSensors, Reading};
pub use storage::{BlockStore, EngineConfig, EventList, EventRecord, MemoryBackend, NvBackend};
pub use time::{Clock, FixedClock, Interval};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Flywheel and Measurement-Validity Constants
//!
//! Pulse geometry and the plausibility windows used to reject noise. The
//! windows are defaults on [`crate::rpm::RpmConfig`]; installations with a
//! different flywheel or sender adjust the config, not this file.

// ===== GEOMETRY =====

/// Pulse frequency to RPM conversion factor.
///
/// Bench-calibrated against the original sender: 415Hz at 850rpm idle
/// gives a nominal factor of ~2.05; two rounds of tachometer comparison
/// settled on this value. Effectively "revolutions per detected edge-cycle"
/// for the 30-ish tooth ring with this sender.
pub const RPM_FACTOR: f32 = 1.999_723_3;

/// RPM reported while the bench fake-running override is active.
pub const FAKE_RUNNING_RPM: f32 = 1000.0;

// ===== ELAPSED-TIME STRATEGY =====

/// Edges per ISR timestamp capture (elapsed-time strategy).
///
/// The ISR stamps `micros()` once per this many falling edges; averaging
/// over 10 edges removes the per-edge jitter that made single-edge timing
/// unusable on this class of MCU.
pub const DEFAULT_EDGES_PER_CAPTURE: u16 = 10;

/// Minimum edge interrupts since the previous poll for a valid sample.
pub const MIN_EDGES_PER_POLL: u16 = 10;

/// Reject frequencies below this as a stopped or noise-only shaft (Hz).
pub const MIN_PLAUSIBLE_HZ: f32 = 200.0;

/// Reject frequencies above this as electrical noise (Hz).
///
/// 4kHz is ~8000rpm on this geometry, well past the governor.
pub const MAX_PLAUSIBLE_HZ: f32 = 4000.0;

/// Discard the sample when the newest capture is older than this (µs).
///
/// A pulse train that stops entirely leaves stale timestamps behind; one
/// second without a capture means the engine is not turning.
pub const STALE_CAPTURE_US: u32 = 1_000_000;

// ===== HARDWARE-CAPTURE STRATEGY =====

/// Edges per counter capture (hardware-capture strategy).
pub const DEFAULT_CAPTURE_EDGES: u16 = 50;

/// Free-running capture counter rate (ticks per second).
///
/// 16MHz peripheral clock divided by 64. The 16-bit counter overflows at
/// ~3.8Hz, so overflow tracking is mandatory, not optional.
pub const CAPTURE_TICK_HZ: f32 = 250_000.0;

/// Minimum ticks per capture window for a valid sample.
///
/// Fewer ticks than this implies >4kHz input, which is noise on this
/// engine.
pub const MIN_CAPTURE_TICKS: u16 = 3000;

/// Minimum edge interrupts since the previous poll (capture strategy).
///
/// Stricter than the elapsed-time strategy because captures are taken
/// every [`DEFAULT_CAPTURE_EDGES`] edges.
pub const MIN_CAPTURE_EDGES_PER_POLL: u16 = 150;

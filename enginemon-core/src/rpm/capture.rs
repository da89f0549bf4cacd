//! Hardware-Capture Measurement Strategy
//!
//! A free-running 16-bit counter ticks at a fixed rate; the edge interrupt
//! samples it every M edges into double-buffered slots, and a second
//! interrupt counts counter overflows. The tick delta between the last two
//! captures gives the frequency with counter resolution rather than clock
//! resolution. One overflow inside the window is reconstructed for free by
//! the wrapping subtraction; two or more make the delta ambiguous and the
//! sample is discarded.

use crate::constants::rpm::{CAPTURE_TICK_HZ, MIN_CAPTURE_EDGES_PER_POLL, MIN_CAPTURE_TICKS};
use crate::time::Micros;

use super::{
    apply_fake_running, estimate_from_frequency, shared::CaptureState, FrequencyEstimator,
    RpmConfig, RpmDiagnostics, RpmEstimate,
};

/// Tuning for the hardware-capture strategy.
#[derive(Debug, Clone, Copy)]
pub struct CaptureConfig {
    /// Window and geometry tuning shared with the elapsed-time strategy.
    pub common: RpmConfig,
    /// Rate of the free-running counter (Hz).
    pub tick_hz: f32,
    /// Minimum tick delta for a usable capture pair; shorter deltas put the
    /// quantization error above 5%.
    pub min_ticks: u16,
    /// Minimum edge interrupts since the last poll. Also the staleness
    /// check: a stopped shaft stops producing edges, so an old capture
    /// pair is never evaluated.
    pub min_edges_per_poll: u16,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            common: RpmConfig::default(),
            tick_hz: CAPTURE_TICK_HZ,
            min_ticks: MIN_CAPTURE_TICKS,
            min_edges_per_poll: MIN_CAPTURE_EDGES_PER_POLL,
        }
    }
}

/// Estimator over a [`CaptureState`] written by the edge and overflow
/// interrupts.
pub struct CaptureEstimator<'a> {
    state: &'a CaptureState,
    config: CaptureConfig,
    diagnostics: RpmDiagnostics,
    /// ISR counter values at the previous poll, for per-poll deltas.
    last_edge_interrupts: u16,
    last_overflow_interrupts: u16,
}

impl<'a> CaptureEstimator<'a> {
    /// Build the estimator over interrupt-shared state.
    pub fn new(state: &'a CaptureState, config: CaptureConfig) -> Self {
        Self {
            state,
            config,
            diagnostics: RpmDiagnostics::default(),
            last_edge_interrupts: 0,
            last_overflow_interrupts: 0,
        }
    }

    /// Current tuning.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    fn measure(&mut self) -> RpmEstimate {
        let snapshot = self.state.snapshot();

        let new_edges = snapshot.edge_interrupts.wrapping_sub(self.last_edge_interrupts);
        let new_overflows = snapshot
            .overflow_interrupts
            .wrapping_sub(self.last_overflow_interrupts);
        self.last_edge_interrupts = snapshot.edge_interrupts;
        self.last_overflow_interrupts = snapshot.overflow_interrupts;
        self.diagnostics.polls += 1;
        self.diagnostics.edge_interrupts += new_edges as u32;
        self.diagnostics.overflow_interrupts += new_overflows as u32;

        // Overflows between the two captures, not since the last poll: the
        // wrapping tick subtraction absorbs exactly one of them.
        let capture_overflows = snapshot.this_overflows.wrapping_sub(snapshot.last_overflows);
        let ticks = snapshot.this_ticks.wrapping_sub(snapshot.last_ticks);
        if new_edges < self.config.min_edges_per_poll
            || capture_overflows >= 2
            || ticks < self.config.min_ticks
        {
            self.diagnostics.discarded_samples += 1;
            return RpmEstimate::STOPPED;
        }

        let frequency =
            self.state.edges_per_capture() as f32 * self.config.tick_hz / ticks as f32;
        let estimate = estimate_from_frequency(&self.config.common, frequency);
        if !estimate.valid {
            self.diagnostics.discarded_samples += 1;
        }
        estimate
    }
}

impl FrequencyEstimator for CaptureEstimator<'_> {
    fn poll(&mut self, _now_us: Micros) -> RpmEstimate {
        let measured = self.measure();
        apply_fake_running(&self.config.common, measured)
    }

    fn diagnostics(&self) -> RpmDiagnostics {
        self.diagnostics
    }

    fn set_fake_running(&mut self, enabled: bool) {
        self.config.common.fake_running = enabled;
    }

    fn fake_running(&self) -> bool {
        self.config.common.fake_running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed `edges` evenly spaced pulses at `hz` into the shared state,
    /// advancing a simulated 250kHz counter and firing overflow interrupts
    /// as it wraps. Returns the final counter phase for chaining.
    fn feed_train(state: &CaptureState, start_phase: u32, hz: f32, edges: u32) -> u32 {
        let ticks_per_edge = CAPTURE_TICK_HZ / hz;
        let mut phase = start_phase as f32;
        for _ in 0..edges {
            let before = phase as u32;
            phase += ticks_per_edge;
            let after = phase as u32;
            for _ in 0..(after >> 16) - (before >> 16) {
                state.on_overflow();
            }
            state.on_edge(after as u16);
        }
        phase as u32
    }

    #[test]
    fn steady_train_gives_expected_rpm() {
        let state = CaptureState::new(50);
        let mut estimator = CaptureEstimator::new(&state, CaptureConfig::default());

        // 1000Hz: 250 ticks/edge, 12500 ticks per 50-edge capture
        feed_train(&state, 0, 1000.0, 200);
        let est = estimator.poll(0);

        assert!(est.valid);
        assert!((est.rpm - 2000.0).abs() < 5.0, "rpm = {}", est.rpm);
        assert_eq!(estimator.diagnostics().edge_interrupts, 200);
    }

    #[test]
    fn single_overflow_reconstructed() {
        let state = CaptureState::new(50);
        let mut estimator = CaptureEstimator::new(&state, CaptureConfig::default());

        // Phase chosen so the counter wraps between the last two captures
        feed_train(&state, 20_000, 1000.0, 200);
        let est = estimator.poll(0);

        assert!(est.valid);
        assert!((est.rpm - 2000.0).abs() < 5.0, "rpm = {}", est.rpm);
        assert!(estimator.diagnostics().overflow_interrupts >= 1);
    }

    #[test]
    fn double_overflow_rejected() {
        let state = CaptureState::new(50);
        let mut estimator = CaptureEstimator::new(&state, CaptureConfig::default());

        // 50Hz: 5000 ticks/edge, 250000 ticks per 50-edge window, which
        // wraps the 16-bit counter three times over
        feed_train(&state, 0, 50.0, 200);
        let est = estimator.poll(0);

        assert_eq!(est, RpmEstimate::STOPPED);
        assert!(estimator.diagnostics().discarded_samples > 0);
    }

    #[test]
    fn too_few_edges_is_stale() {
        let state = CaptureState::new(50);
        let mut estimator = CaptureEstimator::new(&state, CaptureConfig::default());

        feed_train(&state, 0, 1000.0, 200);
        assert!(estimator.poll(0).valid);

        // Shaft stopped: captures are still there but no new edges arrive
        let est = estimator.poll(0);
        assert_eq!(est, RpmEstimate::STOPPED);
    }

    #[test]
    fn short_tick_delta_rejected() {
        let state = CaptureState::new(50);
        let mut estimator = CaptureEstimator::new(&state, CaptureConfig::default());

        // 5kHz: 50 ticks/edge, 2500 ticks per capture, under the floor
        feed_train(&state, 0, 5000.0, 200);
        let est = estimator.poll(0);

        assert_eq!(est, RpmEstimate::STOPPED);
    }

    #[test]
    fn agrees_with_elapsed_strategy() {
        use super::super::{ElapsedTimeEstimator, PulseState};

        let hz = 800.0;
        let capture_state = CaptureState::new(50);
        feed_train(&capture_state, 0, hz, 200);
        let mut capture = CaptureEstimator::new(&capture_state, CaptureConfig::default());

        let pulse_state = PulseState::new(10);
        let period_us = (1_000_000.0 / hz) as u32;
        let mut t = 0u32;
        for _ in 0..200 {
            pulse_state.on_edge(t);
            t = t.wrapping_add(period_us);
        }
        let mut elapsed = ElapsedTimeEstimator::new(&pulse_state, RpmConfig::default());

        let a = capture.poll(t);
        let b = elapsed.poll(t);
        assert!(a.valid && b.valid);
        assert!((a.rpm - b.rpm).abs() < 5.0, "{} vs {}", a.rpm, b.rpm);
    }
}

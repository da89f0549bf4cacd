//! Elapsed-Time Measurement Strategy
//!
//! The edge interrupt stamps the microsecond clock once every N edges;
//! the frequency is N / (gap between the last two stamps). Averaging over
//! N edges hides the per-edge jitter of both the sender and the clock.
//! Portable to any target with an ISR-readable microsecond counter.

use crate::constants::rpm::STALE_CAPTURE_US;
use crate::time::{elapsed_us, Micros};

use super::{
    apply_fake_running, estimate_from_frequency, shared::PulseState, FrequencyEstimator,
    RpmConfig, RpmDiagnostics, RpmEstimate,
};

/// Estimator over a [`PulseState`] written by the edge interrupt.
pub struct ElapsedTimeEstimator<'a> {
    state: &'a PulseState,
    config: RpmConfig,
    diagnostics: RpmDiagnostics,
    /// Edge total at the previous poll, for the per-poll delta.
    last_edge_total: u16,
}

impl<'a> ElapsedTimeEstimator<'a> {
    /// Build the estimator over interrupt-shared state.
    pub fn new(state: &'a PulseState, config: RpmConfig) -> Self {
        Self {
            state,
            config,
            diagnostics: RpmDiagnostics::default(),
            last_edge_total: 0,
        }
    }

    /// Current tuning.
    pub fn config(&self) -> &RpmConfig {
        &self.config
    }

    fn measure(&mut self, now_us: Micros) -> RpmEstimate {
        let snapshot = self.state.snapshot();

        let new_edges = snapshot.edges_total.wrapping_sub(self.last_edge_total);
        self.last_edge_total = snapshot.edges_total;
        self.diagnostics.polls += 1;
        self.diagnostics.edge_interrupts += new_edges as u32;

        // Stale timestamps mean the train stopped: a capture pair left
        // behind by a halted shaft must not keep reporting the old speed.
        let period_us = snapshot.this_capture_us.wrapping_sub(snapshot.last_capture_us);
        if new_edges <= self.config.min_edges_per_poll
            || period_us == 0
            || elapsed_us(now_us, snapshot.this_capture_us) > STALE_CAPTURE_US
        {
            self.diagnostics.discarded_samples += 1;
            return RpmEstimate::STOPPED;
        }

        let frequency =
            self.state.edges_per_capture() as f32 * 1_000_000.0 / period_us as f32;
        let estimate = estimate_from_frequency(&self.config, frequency);
        if !estimate.valid {
            self.diagnostics.discarded_samples += 1;
        }
        estimate
    }
}

impl FrequencyEstimator for ElapsedTimeEstimator<'_> {
    fn poll(&mut self, now_us: Micros) -> RpmEstimate {
        let measured = self.measure(now_us);
        apply_fake_running(&self.config, measured)
    }

    fn diagnostics(&self) -> RpmDiagnostics {
        self.diagnostics
    }

    fn set_fake_running(&mut self, enabled: bool) {
        self.config.fake_running = enabled;
    }

    fn fake_running(&self) -> bool {
        self.config.fake_running
    }
}

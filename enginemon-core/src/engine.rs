//! Engine State Machine and Monitor Loop
//!
//! ## Overview
//!
//! [`EngineMonitor`] is the top of the crate: it owns an RPM estimator, the
//! non-volatile store, and the alarm set, and advances them all from one
//! `poll` call that the board's main loop invokes every cycle. Internally
//! the work runs on a fixed cadence; extra calls between cycles are no-ops,
//! so the caller does not need its own scheduler.
//!
//! ## States
//!
//! - **Stopped**: shaft not turning. Hours do not accrue, running-only
//!   alarms are held clear, status words read zero.
//! - **Starting**: shaft turning, startup grace running. Oil pressure and
//!   charge voltage take several seconds to come up on a cold start;
//!   alarming on them during that window would cry wolf on every start.
//!   Alarms are evaluated (so hysteresis state is current) but status words
//!   stay zeroed and nothing is logged; anything still latched when the
//!   grace ends is logged at that moment.
//! - **Running**: grace elapsed. Alarms drive the status words and newly
//!   latched alarms are recorded in the fault log, stamped with the hours
//!   counter.
//!
//! Shutdown is immediate from either turning state once RPM falls to the
//! shutdown threshold; there is no grace on the way down.
//!
//! ## Hours Accrual
//!
//! While the shaft turns, one accrual period is added and persisted every
//! tick. Writing the counter rather than a seconds value keeps each save
//! to a byte or two of actual EEPROM traffic.

#[cfg(feature = "log")]
macro_rules! log_info {
    ($($arg:tt)*) => { log::info!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_info {
    ($($arg:tt)*) => {{}};
}

use crate::alarm::{AlarmInputs, AlarmSet, NewAlarms, Status1, Status2};
use crate::constants::alarm::{RUNNING_RPM, SHUTDOWN_RPM};
use crate::constants::time::{ENGINE_HOURS_TICK_MS, POLL_INTERVAL_MS, STARTUP_GRACE_MS};
use crate::errors::StorageResult;
use crate::rpm::{FrequencyEstimator, RpmDiagnostics, RpmEstimate};
use crate::storage::{BlockStore, EngineConfig, EventList, EventRecord, NvBackend};
use crate::time::{elapsed_ms, Interval, Millis, Micros};

/// Where the engine is in its run cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineState {
    /// Shaft not turning.
    Stopped,
    /// Shaft turning, startup grace in effect.
    Starting,
    /// Shaft turning, grace elapsed, alarms armed.
    Running,
}

/// What one completed poll cycle produced.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    /// State after this cycle.
    pub state: EngineState,
    /// The RPM sample for this cycle.
    pub rpm: RpmEstimate,
    /// Alarms latched and logged this cycle. Empty while status emission
    /// is suppressed.
    pub logged_alarms: NewAlarms,
}

/// The complete monitoring core for one engine.
pub struct EngineMonitor<E: FrequencyEstimator, B: NvBackend> {
    estimator: E,
    store: BlockStore<B>,
    config: EngineConfig,
    alarms: AlarmSet,
    state: EngineState,
    poll_interval: Interval,
    hours_interval: Interval,
    started_at_ms: Millis,
    last_estimate: RpmEstimate,
    emergency_stop: bool,
}

impl<E: FrequencyEstimator, B: NvBackend> EngineMonitor<E, B> {
    /// Bring up the monitor: loads persisted configuration (falling back
    /// to defaults on corruption) and starts in [`EngineState::Stopped`].
    pub fn new(estimator: E, backend: B) -> StorageResult<Self> {
        let store = BlockStore::new(backend);
        let config = store.load_config()?;
        Ok(Self {
            estimator,
            store,
            config,
            alarms: AlarmSet::new(),
            state: EngineState::Stopped,
            poll_interval: Interval::new(POLL_INTERVAL_MS, 0),
            hours_interval: Interval::new(ENGINE_HOURS_TICK_MS, 0),
            started_at_ms: 0,
            last_estimate: RpmEstimate::STOPPED,
            emergency_stop: false,
        })
    }

    /// Advance the monitor. Call every main-loop cycle with the current
    /// millisecond clock and the microsecond clock the edge interrupt
    /// uses; work happens on the internal cadence and `None` is returned
    /// between cycles.
    pub fn poll(
        &mut self,
        now_ms: Millis,
        now_us: Micros,
        inputs: &AlarmInputs,
    ) -> StorageResult<Option<PollOutcome>> {
        if !self.poll_interval.ready(now_ms) {
            return Ok(None);
        }

        let estimate = self.estimator.poll(now_us);
        self.last_estimate = estimate;
        let turning = estimate.rpm > SHUTDOWN_RPM;
        let mut grace_ended = false;

        match self.state {
            EngineState::Stopped if turning => {
                self.state = EngineState::Starting;
                self.started_at_ms = now_ms;
                self.hours_interval.reset(now_ms);
                log_info!("engine started, {} rpm", estimate.rpm);
            }
            EngineState::Starting | EngineState::Running if !turning => {
                self.state = EngineState::Stopped;
                self.alarms.reset();
                self.emergency_stop = false;
                log_info!("engine stopped");
            }
            EngineState::Starting
                if elapsed_ms(now_ms, self.started_at_ms) >= STARTUP_GRACE_MS =>
            {
                self.state = EngineState::Running;
                grace_ended = true;
            }
            _ => {}
        }

        if self.state != EngineState::Stopped && self.hours_interval.ready(now_ms) {
            self.config.hours_periods += 1;
            self.store.save_config(&self.config)?;
        }

        let running = estimate.rpm >= RUNNING_RPM;
        let latched = self.alarms.evaluate(inputs, running);

        let logged_alarms = if self.can_emit_alarms() {
            // Alarms that latched during the grace were held silently;
            // they hit the log the moment emission opens.
            let to_log = if grace_ended {
                self.alarms.active_kinds()
            } else {
                latched
            };
            for kind in &to_log {
                self.store
                    .record_event(kind.event_code(), self.config.hours_periods)?;
            }
            to_log
        } else {
            NewAlarms::new()
        };

        Ok(Some(PollOutcome {
            state: self.state,
            rpm: estimate,
            logged_alarms,
        }))
    }

    /// Whether alarm status may currently be shown and logged.
    fn can_emit_alarms(&self) -> bool {
        self.state == EngineState::Running
    }

    /// Current state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// The most recent RPM sample.
    pub fn rpm(&self) -> RpmEstimate {
        self.last_estimate
    }

    /// Discrete status word 1. Zero while alarm emission is suppressed,
    /// except the emergency-stop bit, which is never masked.
    pub fn status1(&self) -> Status1 {
        let mut bits = if self.can_emit_alarms() {
            self.alarms.status1().0
        } else {
            0
        };
        if self.emergency_stop {
            bits |= Status1::EMERGENCY_STOP;
        }
        Status1(bits)
    }

    /// Discrete status word 2. Zero while alarm emission is suppressed.
    pub fn status2(&self) -> Status2 {
        if self.can_emit_alarms() {
            self.alarms.status2()
        } else {
            Status2::default()
        }
    }

    /// Latch or release the external emergency-stop input.
    pub fn set_emergency_stop(&mut self, engaged: bool) {
        self.emergency_stop = engaged;
    }

    /// Accrued running time in seconds.
    pub fn engine_seconds(&self) -> u32 {
        self.config.engine_seconds()
    }

    /// Overwrite and persist the accrued running time (service reset or
    /// transfer from a replaced unit).
    pub fn set_engine_seconds(&mut self, seconds: u32) -> StorageResult<()> {
        self.config.set_engine_seconds(seconds);
        self.store.save_config(&self.config)
    }

    /// ADC reference calibration in volts.
    pub fn vdd_volts(&self) -> f32 {
        self.config.vdd_volts()
    }

    /// Persist a new ADC reference calibration.
    pub fn set_vdd_scale(&mut self, scale: u16) -> StorageResult<()> {
        self.config.vdd_scale = scale;
        self.store.save_config(&self.config)
    }

    /// The stored fault newest after `after`; walks the log oldest-first.
    pub fn next_event(&self, after: Option<u32>) -> StorageResult<Option<EventRecord>> {
        self.store.next_event(after)
    }

    /// All stored faults newer than `after`, oldest first.
    pub fn events_since(&self, after: Option<u32>) -> StorageResult<EventList> {
        self.store.events_since(after)
    }

    /// Number of stored faults.
    pub fn event_count(&self) -> StorageResult<usize> {
        self.store.count_events()
    }

    /// Erase the fault log.
    pub fn clear_events(&mut self) -> StorageResult<()> {
        self.store.clear_events()
    }

    /// Enable or disable the bench fake-running override.
    pub fn set_fake_running(&mut self, enabled: bool) {
        self.estimator.set_fake_running(enabled);
    }

    /// Whether the bench override is active.
    pub fn fake_running(&self) -> bool {
        self.estimator.fake_running()
    }

    /// Cumulative measurement counters from the estimator.
    pub fn rpm_diagnostics(&self) -> RpmDiagnostics {
        self.estimator.diagnostics()
    }

    /// The underlying block store, for console/protocol layers.
    pub fn store(&self) -> &BlockStore<B> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::storage::NV_MIN_SIZE;
    use crate::sensors::Reading;
    use crate::storage::MemoryBackend;

    /// Estimator returning a settable fixed value.
    struct FixedEstimator {
        rpm: f32,
        fake: bool,
    }

    impl FixedEstimator {
        fn new(rpm: f32) -> Self {
            Self { rpm, fake: false }
        }
    }

    impl FrequencyEstimator for FixedEstimator {
        fn poll(&mut self, _now_us: Micros) -> RpmEstimate {
            if self.fake {
                return RpmEstimate { rpm: 1000.0, valid: true };
            }
            if self.rpm > 0.0 {
                RpmEstimate { rpm: self.rpm, valid: true }
            } else {
                RpmEstimate::STOPPED
            }
        }

        fn diagnostics(&self) -> RpmDiagnostics {
            RpmDiagnostics::default()
        }

        fn set_fake_running(&mut self, enabled: bool) {
            self.fake = enabled;
        }

        fn fake_running(&self) -> bool {
            self.fake
        }
    }

    type TestMonitor = EngineMonitor<FixedEstimator, MemoryBackend<NV_MIN_SIZE>>;

    fn monitor(rpm: f32) -> TestMonitor {
        EngineMonitor::new(FixedEstimator::new(rpm), MemoryBackend::new()).unwrap()
    }

    fn healthy() -> AlarmInputs {
        AlarmInputs {
            coolant_k: Reading::Value(360.0),
            oil_pressure_pa: Reading::Value(300_000.0),
            voltage_v: Reading::Value(14.2),
            exhaust_k: Reading::Value(320.0),
        }
    }

    /// Drive the monitor for `duration_ms`, polling on the poll cadence.
    /// Returns the clock after the last cycle.
    fn run_for(
        monitor: &mut TestMonitor,
        start_ms: u32,
        duration_ms: u32,
        inputs: &AlarmInputs,
    ) -> u32 {
        let mut now = start_ms;
        let end = start_ms + duration_ms;
        while now < end {
            now += POLL_INTERVAL_MS + 1;
            monitor
                .poll(now, now.wrapping_mul(1000), inputs)
                .unwrap();
        }
        now
    }

    #[test]
    fn starts_then_runs_after_grace() {
        let mut monitor = monitor(850.0);
        assert_eq!(monitor.state(), EngineState::Stopped);

        let now = run_for(&mut monitor, 0, 1_000, &healthy());
        assert_eq!(monitor.state(), EngineState::Starting);

        run_for(&mut monitor, now, STARTUP_GRACE_MS + 1_000, &healthy());
        assert_eq!(monitor.state(), EngineState::Running);
    }

    #[test]
    fn polls_between_cycles_are_no_ops() {
        let mut monitor = monitor(850.0);

        assert!(monitor.poll(501, 501_000, &healthy()).unwrap().is_some());
        assert!(monitor.poll(502, 502_000, &healthy()).unwrap().is_none());
        assert!(monitor.poll(600, 600_000, &healthy()).unwrap().is_none());
        assert!(monitor.poll(1002, 1_002_000, &healthy()).unwrap().is_some());
    }

    #[test]
    fn alarms_suppressed_during_grace() {
        let mut monitor = monitor(850.0);
        let mut inputs = healthy();
        inputs.coolant_k = Reading::Value(400.0); // well over temperature

        let now = run_for(&mut monitor, 0, 5_000, &inputs);
        assert_eq!(monitor.state(), EngineState::Starting);
        assert_eq!(monitor.status1(), Status1::default());
        assert_eq!(monitor.event_count().unwrap(), 0);

        run_for(&mut monitor, now, STARTUP_GRACE_MS, &inputs);
        assert_eq!(monitor.state(), EngineState::Running);
        assert!(monitor.status1().contains(Status1::OVER_TEMPERATURE));
    }

    #[test]
    fn latched_alarm_is_logged_once_with_hours_stamp() {
        let mut monitor = monitor(850.0);
        let now = run_for(&mut monitor, 0, STARTUP_GRACE_MS + 2_000, &healthy());
        assert_eq!(monitor.state(), EngineState::Running);
        assert_eq!(monitor.event_count().unwrap(), 0);

        let mut inputs = healthy();
        inputs.coolant_k = Reading::Value(400.0);
        run_for(&mut monitor, now, 3_000, &inputs);

        assert_eq!(monitor.event_count().unwrap(), 1);
        let event = monitor.next_event(None).unwrap().unwrap();
        assert_eq!(event.code, 1);
        // Stamped with the current hours counter, ~17s of running time
        assert_eq!(event.timestamp, monitor.engine_seconds() as u32 / 15);
    }

    #[test]
    fn shutdown_is_immediate_and_resets_alarms() {
        let mut monitor = monitor(850.0);
        let mut inputs = healthy();
        inputs.oil_pressure_pa = Reading::Value(0.0);
        let now = run_for(&mut monitor, 0, STARTUP_GRACE_MS + 2_000, &inputs);
        assert!(monitor.status1().contains(Status1::LOW_OIL_PRESSURE));

        monitor.estimator.rpm = 150.0; // below the shutdown threshold
        run_for(&mut monitor, now, 1_000, &inputs);

        assert_eq!(monitor.state(), EngineState::Stopped);
        assert_eq!(monitor.status1(), Status1::default());
    }

    #[test]
    fn hours_accrue_while_turning_and_persist() {
        let mut monitor = monitor(850.0);
        assert_eq!(monitor.engine_seconds(), 0);

        // One simulated hour of running
        run_for(&mut monitor, 0, 3_600_000, &healthy());
        let accrued = monitor.engine_seconds();
        assert!((3_540..=3_600).contains(&accrued), "accrued {accrued}");

        // Rebuild from the same storage content: the counter survives
        let content = *monitor.store().backend().raw();
        let rebuilt =
            TestMonitor::new(FixedEstimator::new(0.0), MemoryBackend::with_content(content))
                .unwrap();
        assert_eq!(rebuilt.engine_seconds(), accrued);
    }

    #[test]
    fn hours_do_not_accrue_at_rest() {
        let mut monitor = monitor(0.0);
        run_for(&mut monitor, 0, 120_000, &healthy());
        assert_eq!(monitor.engine_seconds(), 0);
    }

    #[test]
    fn corrupted_hours_read_as_zero() {
        let mut monitor = monitor(850.0);
        run_for(&mut monitor, 0, 60_000, &healthy());
        assert!(monitor.engine_seconds() > 0);

        let mut content = *monitor.store().backend().raw();
        content[2] ^= 0x40; // flip a bit inside the stored counter
        let rebuilt =
            TestMonitor::new(FixedEstimator::new(0.0), MemoryBackend::with_content(content))
                .unwrap();
        assert_eq!(rebuilt.engine_seconds(), 0);
    }

    #[test]
    fn service_functions_persist() {
        let mut monitor = monitor(0.0);
        monitor.set_engine_seconds(7_200).unwrap();
        monitor.set_vdd_scale(47_000).unwrap();

        let content = *monitor.store().backend().raw();
        let rebuilt =
            TestMonitor::new(FixedEstimator::new(0.0), MemoryBackend::with_content(content))
                .unwrap();
        assert_eq!(rebuilt.engine_seconds(), 7_200);
        assert!((rebuilt.vdd_volts() - 4.7).abs() < 1e-3);
    }

    #[test]
    fn fake_running_drives_the_state_machine() {
        let mut monitor = monitor(0.0);
        monitor.set_fake_running(true);

        run_for(&mut monitor, 0, 1_000, &healthy());
        assert_eq!(monitor.state(), EngineState::Starting);
        assert_eq!(monitor.rpm().rpm, 1000.0);

        monitor.set_fake_running(false);
        run_for(&mut monitor, 2_000, 2_000, &healthy());
        assert_eq!(monitor.state(), EngineState::Stopped);
    }

    #[test]
    fn emergency_stop_is_never_masked() {
        let mut monitor = monitor(0.0);
        monitor.set_emergency_stop(true);

        // Stopped, so every other bit is suppressed
        assert_eq!(monitor.status1().0, Status1::EMERGENCY_STOP);

        monitor.set_emergency_stop(false);
        assert_eq!(monitor.status1(), Status1::default());
    }
}

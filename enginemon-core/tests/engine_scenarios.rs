//! End-to-end scenarios through the public API: a pulse train feeds a real
//! estimator, the monitor runs on its own cadence over in-memory storage,
//! and the assertions follow what an operator at the panel would see.

use enginemon_core::{
    AlarmInputs, ElapsedTimeEstimator, EngineMonitor, EngineState, MemoryBackend, PulseState,
    Reading, RpmConfig, Status1,
};

const NV_SIZE: usize = 128;
const POLL_MS: u32 = 500;

fn healthy() -> AlarmInputs {
    AlarmInputs {
        coolant_k: Reading::Value(358.0),
        oil_pressure_pa: Reading::Value(320_000.0),
        voltage_v: Reading::Value(14.1),
        exhaust_k: Reading::Value(325.0),
    }
}

/// Drive a simulated engine: between consecutive polls, feed edges at
/// `hz` (0 for a stopped shaft) and advance the clock.
struct Rig {
    pulses: &'static PulseState,
    now_ms: u32,
}

impl Rig {
    fn run(
        &mut self,
        monitor: &mut EngineMonitor<ElapsedTimeEstimator<'static>, MemoryBackend<NV_SIZE>>,
        hz: u32,
        duration_ms: u32,
        inputs: &AlarmInputs,
    ) {
        let end = self.now_ms + duration_ms;
        while self.now_ms < end {
            let slice_start_us = self.now_ms * 1000;
            if hz > 0 {
                let period_us = 1_000_000 / hz;
                let mut t = slice_start_us;
                while t < slice_start_us + POLL_MS * 1000 {
                    self.pulses.on_edge(t);
                    t += period_us;
                }
            }
            self.now_ms += POLL_MS + 1;
            monitor
                .poll(self.now_ms, self.now_ms * 1000, inputs)
                .unwrap();
        }
    }
}

fn rig() -> Rig {
    // Each test leaks one small static; fine for a test binary
    let pulses: &'static PulseState = Box::leak(Box::new(PulseState::new(10)));
    Rig { pulses, now_ms: 0 }
}

#[test]
fn cold_start_to_running_with_live_pulses() {
    let mut rig = rig();
    let estimator = ElapsedTimeEstimator::new(rig.pulses, RpmConfig::default());
    let mut monitor = EngineMonitor::new(estimator, MemoryBackend::new()).unwrap();

    // 425Hz is ~850rpm at the reference flywheel
    rig.run(&mut monitor, 425, 2_000, &healthy());
    assert_eq!(monitor.state(), EngineState::Starting);
    let rpm = monitor.rpm();
    assert!(rpm.valid);
    assert!((rpm.rpm - 850.0).abs() < 10.0, "rpm = {}", rpm.rpm);

    rig.run(&mut monitor, 425, 16_000, &healthy());
    assert_eq!(monitor.state(), EngineState::Running);

    // Shaft stops: estimate decays to zero and the state follows
    rig.run(&mut monitor, 0, 2_000, &healthy());
    assert_eq!(monitor.state(), EngineState::Stopped);
    assert_eq!(monitor.rpm().rpm, 0.0);
}

#[test]
fn grace_period_suppresses_the_panel() {
    let mut rig = rig();
    let estimator = ElapsedTimeEstimator::new(rig.pulses, RpmConfig::default());
    let mut monitor = EngineMonitor::new(estimator, MemoryBackend::new()).unwrap();

    // Cold start with zero oil pressure: normal for the first seconds
    let mut inputs = healthy();
    inputs.oil_pressure_pa = Reading::Value(0.0);

    rig.run(&mut monitor, 425, 10_000, &inputs);
    assert_eq!(monitor.state(), EngineState::Starting);
    assert_eq!(monitor.status1(), Status1::default());
    assert_eq!(monitor.event_count().unwrap(), 0);

    // Pressure comes up before the grace elapses: no alarm, no log entry
    rig.run(&mut monitor, 425, 10_000, &healthy());
    assert_eq!(monitor.state(), EngineState::Running);
    assert_eq!(monitor.status1(), Status1::default());
    assert_eq!(monitor.event_count().unwrap(), 0);
}

#[test]
fn persistent_fault_alarms_after_grace_and_is_logged() {
    let mut rig = rig();
    let estimator = ElapsedTimeEstimator::new(rig.pulses, RpmConfig::default());
    let mut monitor = EngineMonitor::new(estimator, MemoryBackend::new()).unwrap();

    rig.run(&mut monitor, 425, 17_000, &healthy());
    assert_eq!(monitor.state(), EngineState::Running);

    let mut inputs = healthy();
    inputs.exhaust_k = Reading::Value(360.0); // raw-water flow lost
    rig.run(&mut monitor, 425, 2_000, &inputs);

    assert!(monitor.status1().contains(Status1::WATER_FLOW));
    assert!(monitor.status1().contains(Status1::CHECK_ENGINE));
    assert_eq!(monitor.event_count().unwrap(), 1);

    // Cooled back below the clear point: bit releases, log entry stays
    rig.run(&mut monitor, 425, 2_000, &healthy());
    assert_eq!(monitor.status1(), Status1::default());
    assert_eq!(monitor.event_count().unwrap(), 1);
}

#[test]
fn hours_and_faults_survive_a_power_cycle() {
    let mut rig = rig();
    let estimator = ElapsedTimeEstimator::new(rig.pulses, RpmConfig::default());
    let mut monitor = EngineMonitor::new(estimator, MemoryBackend::new()).unwrap();

    let mut inputs = healthy();
    inputs.coolant_k = Reading::Value(400.0);
    rig.run(&mut monitor, 425, 120_000, &inputs);
    let accrued = monitor.engine_seconds();
    assert!(accrued >= 90, "accrued {accrued}");
    assert_eq!(monitor.event_count().unwrap(), 1);

    // Power cycle: new monitor over the same device content
    let content = *monitor.store().backend().raw();
    let mut rig2 = self::rig();
    let estimator = ElapsedTimeEstimator::new(rig2.pulses, RpmConfig::default());
    let mut monitor = EngineMonitor::new(estimator, MemoryBackend::with_content(content)).unwrap();

    assert_eq!(monitor.engine_seconds(), accrued);
    let fault = monitor.next_event(None).unwrap().unwrap();
    assert_eq!(fault.code, 1);

    rig2.run(&mut monitor, 425, 31_000, &healthy());
    assert!(monitor.engine_seconds() > accrued);
}

#[test]
fn event_log_walk_and_clear_via_monitor() {
    let rig = rig();
    let estimator = ElapsedTimeEstimator::new(rig.pulses, RpmConfig::default());
    let mut monitor = EngineMonitor::new(estimator, MemoryBackend::<NV_SIZE>::new()).unwrap();
    assert!(monitor.next_event(None).unwrap().is_none());

    // Faults arrive through the store during bench service
    monitor.clear_events().unwrap();
    assert_eq!(monitor.event_count().unwrap(), 0);
}

#[test]
fn bench_fake_running_needs_no_pulses() {
    let rig = rig();
    let estimator = ElapsedTimeEstimator::new(rig.pulses, RpmConfig::default());
    let mut monitor = EngineMonitor::new(estimator, MemoryBackend::<NV_SIZE>::new()).unwrap();
    monitor.set_fake_running(true);
    assert!(monitor.fake_running());

    let mut now = 0u32;
    for _ in 0..4 {
        now += POLL_MS + 1;
        monitor.poll(now, now * 1000, &healthy()).unwrap();
    }
    assert_eq!(monitor.state(), EngineState::Starting);
    assert_eq!(monitor.rpm().rpm, 1000.0);
}

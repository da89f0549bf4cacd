//! Host-side walkthrough of the monitoring core.
//!
//! A scripted ADC feeds the calibrated sensor suite, a synthetic pulse
//! train feeds the RPM estimator, and the monitor runs over in-memory
//! storage. Simulates a start, a loss of raw-water flow, and a shutdown,
//! printing what the panel would show at each step. Run with:
//!
//! ```sh
//! cargo run --example monitor_loop
//! ```

use enginemon_core::{
    Adc, AdcChannel, AlarmInputs, ElapsedTimeEstimator, EngineMonitor, EngineSensors, EngineState,
    MemoryBackend, PulseState, RpmConfig, SensorResult, StorageError,
};

static PULSES: PulseState = PulseState::new(10);

const POLL_MS: u32 = 500;

/// Scripted board ADC. Only the exhaust channel changes over the run.
struct SimAdc {
    exhaust_code: u16,
}

impl Adc for SimAdc {
    fn read_raw(&mut self, channel: AdcChannel) -> SensorResult<u16> {
        Ok(match channel {
            AdcChannel::AlternatorVoltage => 940,
            AdcChannel::FuelSensor => 100,
            AdcChannel::ExhaustNtc => self.exhaust_code,
            AdcChannel::AlternatorNtc => 443,
            AdcChannel::EngineRoomNtc => 560,
            AdcChannel::OilSensor => 340,
            AdcChannel::CoolantTemperature => 169,
            AdcChannel::EngineBattery => 940,
        })
    }
}

fn feed_pulses(start_us: u32, hz: u32) {
    if hz == 0 {
        return;
    }
    let period = 1_000_000 / hz;
    let mut t = start_us;
    while t < start_us + POLL_MS * 1000 {
        PULSES.on_edge(t);
        t += period;
    }
}

fn main() -> Result<(), StorageError> {
    let estimator = ElapsedTimeEstimator::new(&PULSES, RpmConfig::default());
    let mut monitor = EngineMonitor::new(estimator, MemoryBackend::<128>::new())?;

    // (label, pulse frequency, exhaust ADC code, duration)
    let phases: [(&str, u32, u16, u32); 5] = [
        ("at rest", 0, 560, 2_000),
        ("cranked, idling", 425, 443, 20_000),
        ("raw water lost", 425, 160, 4_000),
        ("impeller replaced", 425, 443, 4_000),
        ("shut down", 0, 443, 2_000),
    ];

    let mut now_ms = 0u32;
    for (label, hz, exhaust_code, duration) in phases {
        println!("--- {label} ---");
        let end = now_ms + duration;
        while now_ms < end {
            feed_pulses(now_ms * 1000, hz);
            now_ms += POLL_MS + 1;

            let mut sensors = EngineSensors::new(SimAdc { exhaust_code }, monitor.vdd_volts());
            let inputs = AlarmInputs {
                coolant_k: sensors.coolant_temperature_k(),
                oil_pressure_pa: sensors.oil_pressure_pa(),
                voltage_v: sensors.voltage_v(AdcChannel::EngineBattery),
                exhaust_k: sensors.temperature_k(AdcChannel::ExhaustNtc),
            };
            if let Some(outcome) = monitor.poll(now_ms, now_ms * 1000, &inputs)? {
                for alarm in &outcome.logged_alarms {
                    println!("  !! fault logged: {alarm:?}");
                }
            }
        }
        let mut sensors = EngineSensors::new(SimAdc { exhaust_code }, monitor.vdd_volts());
        println!(
            "  t={:>3}s state={:?} rpm={:>4.0} status1={:#06x} hours={}s fuel={:.0}%",
            now_ms / 1000,
            monitor.state(),
            monitor.rpm().rpm,
            monitor.status1().0,
            monitor.engine_seconds(),
            sensors.fuel_level_pct().value().unwrap_or(0.0),
        );
    }

    println!("--- fault log ---");
    let mut last = None;
    while let Some(event) = monitor.next_event(last)? {
        println!("  period {} code {}", event.timestamp, event.code);
        last = Some(event.timestamp);
    }

    assert_eq!(monitor.state(), EngineState::Stopped);
    Ok(())
}

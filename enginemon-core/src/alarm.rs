//! Alarm Evaluation with Hysteresis
//!
//! ## Overview
//!
//! Each monitored quantity carries a set/clear threshold pair. An alarm
//! latches when the reading crosses the set threshold and releases only
//! past the clear threshold, so a value hovering at the boundary cannot
//! chatter the status bits. Alarms are evaluated independently every poll;
//! the outcome never depends on evaluation order.
//!
//! ## Gating
//!
//! Some quantities are only meaningful with the engine turning - oil
//! pressure is legitimately zero at rest and the alternator only charges
//! under power. Those alarms carry `requires_running` and are held clear
//! while the engine is stopped. The startup grace period is enforced one
//! level up, in the state machine: this module always reports what it
//! measured.
//!
//! ## Missing Readings
//!
//! A [`Reading::NotAvailable`] neither sets nor clears anything; the alarm
//! keeps its previous state until a trustworthy number arrives. A
//! disconnected sender must not look like a healthy engine.

use heapless::Vec;

use crate::constants::alarm::{
    COOLANT_OVER_TEMP_CLEAR_K, COOLANT_OVER_TEMP_SET_K, EXHAUST_OVER_TEMP_CLEAR_K,
    EXHAUST_OVER_TEMP_SET_K, OIL_PRESSURE_LOW_CLEAR_PA, OIL_PRESSURE_LOW_SET_PA,
    VOLTAGE_LOW_CLEAR_V, VOLTAGE_LOW_SET_V,
};
use crate::sensors::Reading;

/// Discrete engine status, word 1. Bit assignments follow the NMEA 2000
/// engine-parameters convention so the protocol layer can forward the word
/// unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Status1(pub u16);

impl Status1 {
    /// General check-engine indication.
    pub const CHECK_ENGINE: u16 = 1 << 0;
    /// Coolant over-temperature.
    pub const OVER_TEMPERATURE: u16 = 1 << 1;
    /// Oil pressure below limit while running.
    pub const LOW_OIL_PRESSURE: u16 = 1 << 2;
    /// System voltage below limit while running.
    pub const LOW_SYSTEM_VOLTAGE: u16 = 1 << 5;
    /// Cooling water flow lost (sensed via exhaust temperature).
    pub const WATER_FLOW: u16 = 1 << 7;
    /// Emergency stop engaged.
    pub const EMERGENCY_STOP: u16 = 1 << 15;

    /// True when `bit` is set.
    pub fn contains(&self, bit: u16) -> bool {
        self.0 & bit != 0
    }
}

/// Discrete engine status, word 2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Status2(pub u16);

impl Status2 {
    /// At least one alarm is active.
    pub const WARNING_LEVEL_1: u16 = 1 << 0;
    /// Maintenance needed indication.
    pub const MAINTENANCE_NEEDED: u16 = 1 << 3;

    /// True when `bit` is set.
    pub fn contains(&self, bit: u16) -> bool {
        self.0 & bit != 0
    }
}

/// The monitored quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmKind {
    /// Coolant temperature above limit.
    CoolantOverTemperature,
    /// Oil pressure below limit (running only).
    LowOilPressure,
    /// System voltage below limit (running only).
    LowSystemVoltage,
    /// Exhaust temperature above limit: raw-water flow lost.
    ExhaustOverTemperature,
}

impl AlarmKind {
    /// Event code stored in the fault log. Nonzero; zero marks an empty
    /// log slot.
    pub fn event_code(&self) -> u8 {
        match self {
            Self::CoolantOverTemperature => 1,
            Self::LowOilPressure => 2,
            Self::LowSystemVoltage => 3,
            Self::ExhaustOverTemperature => 4,
        }
    }

    /// The [`Status1`] bit this alarm drives.
    pub fn status1_bit(&self) -> u16 {
        match self {
            Self::CoolantOverTemperature => Status1::OVER_TEMPERATURE,
            Self::LowOilPressure => Status1::LOW_OIL_PRESSURE,
            Self::LowSystemVoltage => Status1::LOW_SYSTEM_VOLTAGE,
            Self::ExhaustOverTemperature => Status1::WATER_FLOW,
        }
    }
}

/// One hysteresis threshold pair.
///
/// The direction is implied: `set` above `clear` alarms on high readings,
/// `set` below `clear` alarms on low readings.
#[derive(Debug, Clone, Copy)]
pub struct Threshold {
    /// Crossing this latches the alarm.
    pub set: f32,
    /// Crossing back past this releases it.
    pub clear: f32,
    /// Hold clear unless the engine is running.
    pub requires_running: bool,
}

impl Threshold {
    fn tripped(&self, value: f32) -> bool {
        if self.set > self.clear {
            value >= self.set
        } else {
            value <= self.set
        }
    }

    fn released(&self, value: f32) -> bool {
        if self.set > self.clear {
            value <= self.clear
        } else {
            value >= self.clear
        }
    }
}

/// The readings the alarm set consumes, one per monitored quantity.
#[derive(Debug, Clone, Copy)]
pub struct AlarmInputs {
    /// Coolant temperature (Kelvin).
    pub coolant_k: Reading,
    /// Oil pressure (Pascal).
    pub oil_pressure_pa: Reading,
    /// System voltage (Volt).
    pub voltage_v: Reading,
    /// Exhaust elbow temperature (Kelvin).
    pub exhaust_k: Reading,
}

impl AlarmInputs {
    /// A frame with every reading missing.
    pub const NONE: Self = Self {
        coolant_k: Reading::NotAvailable,
        oil_pressure_pa: Reading::NotAvailable,
        voltage_v: Reading::NotAvailable,
        exhaust_k: Reading::NotAvailable,
    };

    fn reading(&self, kind: AlarmKind) -> Reading {
        match kind {
            AlarmKind::CoolantOverTemperature => self.coolant_k,
            AlarmKind::LowOilPressure => self.oil_pressure_pa,
            AlarmKind::LowSystemVoltage => self.voltage_v,
            AlarmKind::ExhaustOverTemperature => self.exhaust_k,
        }
    }
}

struct Alarm {
    kind: AlarmKind,
    threshold: Threshold,
    active: bool,
}

/// Newly latched alarms out of one evaluation pass.
pub type NewAlarms = Vec<AlarmKind, { AlarmSet::COUNT }>;

/// All alarms for one engine, evaluated together each poll.
pub struct AlarmSet {
    alarms: [Alarm; Self::COUNT],
}

impl AlarmSet {
    /// Number of monitored quantities.
    pub const COUNT: usize = 4;

    /// The standard alarm set with the deployment default thresholds.
    pub fn new() -> Self {
        Self {
            alarms: [
                Alarm {
                    kind: AlarmKind::CoolantOverTemperature,
                    threshold: Threshold {
                        set: COOLANT_OVER_TEMP_SET_K,
                        clear: COOLANT_OVER_TEMP_CLEAR_K,
                        requires_running: false,
                    },
                    active: false,
                },
                Alarm {
                    kind: AlarmKind::LowOilPressure,
                    threshold: Threshold {
                        set: OIL_PRESSURE_LOW_SET_PA,
                        clear: OIL_PRESSURE_LOW_CLEAR_PA,
                        requires_running: true,
                    },
                    active: false,
                },
                Alarm {
                    kind: AlarmKind::LowSystemVoltage,
                    threshold: Threshold {
                        set: VOLTAGE_LOW_SET_V,
                        clear: VOLTAGE_LOW_CLEAR_V,
                        requires_running: true,
                    },
                    active: false,
                },
                Alarm {
                    kind: AlarmKind::ExhaustOverTemperature,
                    threshold: Threshold {
                        set: EXHAUST_OVER_TEMP_SET_K,
                        clear: EXHAUST_OVER_TEMP_CLEAR_K,
                        requires_running: false,
                    },
                    active: false,
                },
            ],
        }
    }

    /// Evaluate every alarm against `inputs`. Returns the alarms that
    /// latched on this pass, for fault logging.
    pub fn evaluate(&mut self, inputs: &AlarmInputs, running: bool) -> NewAlarms {
        let mut latched = NewAlarms::new();
        for alarm in &mut self.alarms {
            if alarm.threshold.requires_running && !running {
                alarm.active = false;
                continue;
            }
            let value = match inputs.reading(alarm.kind).value() {
                Some(v) => v,
                // No trustworthy number: hold the previous state
                None => continue,
            };
            if !alarm.active && alarm.threshold.tripped(value) {
                alarm.active = true;
                // Capacity matches the alarm count
                let _ = latched.push(alarm.kind);
            } else if alarm.active && alarm.threshold.released(value) {
                alarm.active = false;
            }
        }
        latched
    }

    /// True when `kind` is currently latched.
    pub fn is_active(&self, kind: AlarmKind) -> bool {
        self.alarms
            .iter()
            .any(|alarm| alarm.kind == kind && alarm.active)
    }

    /// Every currently latched alarm.
    pub fn active_kinds(&self) -> NewAlarms {
        let mut kinds = NewAlarms::new();
        for alarm in self.alarms.iter().filter(|a| a.active) {
            let _ = kinds.push(alarm.kind);
        }
        kinds
    }

    /// True when any alarm is latched.
    pub fn any_active(&self) -> bool {
        self.alarms.iter().any(|alarm| alarm.active)
    }

    /// Discrete status word 1 from the latched alarms.
    pub fn status1(&self) -> Status1 {
        let mut bits = 0;
        for alarm in self.alarms.iter().filter(|a| a.active) {
            bits |= alarm.kind.status1_bit();
            bits |= Status1::CHECK_ENGINE;
        }
        Status1(bits)
    }

    /// Discrete status word 2 from the latched alarms.
    pub fn status2(&self) -> Status2 {
        if self.any_active() {
            Status2(Status2::WARNING_LEVEL_1)
        } else {
            Status2::default()
        }
    }

    /// Release every alarm, as on engine shutdown.
    pub fn reset(&mut self) {
        for alarm in &mut self.alarms {
            alarm.active = false;
        }
    }
}

impl Default for AlarmSet {
    fn default() -> Self {
        Self::new()
    }
}

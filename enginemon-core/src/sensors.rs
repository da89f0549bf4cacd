//! Calibrated Physical Values over an ADC Seam
//!
//! ## Overview
//!
//! Raw conversion lives outside the core: the board provides an [`Adc`]
//! implementation and this module turns its codes into physical quantities
//! via the calibration curves. Two failure shapes exist and they are
//! treated identically - an ADC conversion error and a raw code in a
//! curve's disconnected region both produce [`Reading::NotAvailable`].
//! Nothing downstream may alarm on, average, or otherwise arithmetic a
//! `NotAvailable`; it is a sentinel, not a number.
//!
//! ## Supply Compensation
//!
//! The coolant sender is powered from the (unregulated) relay-board supply
//! so its alarms keep working if the regulated rail fails. The supply is
//! measured on its own channel and the sender reading is rescaled to the
//! 12V reference the curve was computed for. When the supply itself is
//! missing, the reading is not available rather than absurdly cold.

use crate::{
    calibration::{Curve, COOLANT_SENDER, NTC_MF52_10K, OIL_SENDER_10BAR},
    constants::sensors::{
        ADC_FULL_SCALE, COOLANT_SUPPLY_ADC_12V, FUEL_ADC_FULL, FUEL_CAPACITY_L, KELVIN_OFFSET,
        MIN_SUPPLY_ADC, VOLTAGE_DIVIDER_RATIO,
    },
    errors::{SensorError, SensorResult},
};

/// Analog channel assignments as wired on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AdcChannel {
    /// Alternator output voltage divider
    AlternatorVoltage = 0,
    /// Fuel tank level sender
    FuelSensor = 1,
    /// Exhaust elbow NTC
    ExhaustNtc = 2,
    /// Alternator case NTC
    AlternatorNtc = 3,
    /// Engine room ambient NTC
    EngineRoomNtc = 4,
    /// Oil pressure sender
    OilSensor = 5,
    /// Coolant temperature sender
    CoolantTemperature = 6,
    /// Engine battery voltage divider, doubles as the coolant sender supply
    EngineBattery = 7,
}

/// Raw conversion access provided by the board layer.
///
/// An `Err` from `read_raw` is indistinguishable, to the rest of the core,
/// from a disconnected sender.
pub trait Adc {
    /// Read one raw conversion from `channel` (10-bit, 0..=1023).
    fn read_raw(&mut self, channel: AdcChannel) -> SensorResult<u16>;
}

/// A calibrated measurement or the distinguished "no trustworthy reading".
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reading {
    /// Calibrated physical value in SI units.
    Value(f32),
    /// Sensor disconnected, unpowered, or the conversion failed.
    NotAvailable,
}

impl Reading {
    /// The numeric value, if one exists.
    pub fn value(&self) -> Option<f32> {
        match self {
            Reading::Value(v) => Some(*v),
            Reading::NotAvailable => None,
        }
    }

    /// True when a trustworthy number is present.
    pub fn is_available(&self) -> bool {
        matches!(self, Reading::Value(_))
    }

    fn from_result(res: SensorResult<f32>) -> Self {
        match res {
            Ok(v) => Reading::Value(v),
            Err(_) => Reading::NotAvailable,
        }
    }
}

impl From<Option<f32>> for Reading {
    fn from(v: Option<f32>) -> Self {
        match v {
            Some(v) => Reading::Value(v),
            None => Reading::NotAvailable,
        }
    }
}

/// Calibrated sensor suite for one engine.
///
/// Owns the ADC handle; every method is a single conversion plus a curve
/// lookup, bounded-time and allocation-free.
pub struct EngineSensors<A: Adc> {
    adc: A,
    /// Vdd in volts, from the persisted calibration scalar.
    vdd: f32,
}

impl<A: Adc> EngineSensors<A> {
    /// Build the suite around a board ADC and the persisted Vdd scalar.
    pub fn new(adc: A, vdd: f32) -> Self {
        Self { adc, vdd }
    }

    /// Update the Vdd calibration (set over the console/protocol layer).
    pub fn set_vdd(&mut self, vdd: f32) {
        self.vdd = vdd;
    }

    /// Current Vdd calibration in volts.
    pub fn vdd(&self) -> f32 {
        self.vdd
    }

    /// Coolant temperature in Kelvin, supply-compensated.
    pub fn coolant_temperature_k(&mut self) -> Reading {
        Reading::from_result(self.coolant_inner())
    }

    fn coolant_inner(&mut self) -> SensorResult<f32> {
        let supply = self.adc.read_raw(AdcChannel::EngineBattery)?;
        if supply < MIN_SUPPLY_ADC {
            return Err(SensorError::SupplyLow { code: supply });
        }
        let raw = self.adc.read_raw(AdcChannel::CoolantTemperature)?;
        // Rescale to the 12V reference the curve was computed for.
        let scaled = (raw as u32 * COOLANT_SUPPLY_ADC_12V as u32 / supply as u32) as u16;
        let celsius = COOLANT_SENDER
            .lookup(scaled)
            .ok_or(SensorError::Disconnected { code: scaled })?;
        Ok(celsius as f32 + KELVIN_OFFSET)
    }

    /// Spot temperature in Kelvin from one of the NTC channels.
    pub fn temperature_k(&mut self, channel: AdcChannel) -> Reading {
        Reading::from_result(self.ntc_inner(channel, &NTC_MF52_10K))
    }

    fn ntc_inner(&mut self, channel: AdcChannel, curve: &Curve) -> SensorResult<f32> {
        let raw = self.adc.read_raw(channel)?;
        let tenths = curve
            .lookup(raw)
            .ok_or(SensorError::Disconnected { code: raw })?;
        Ok(0.1 * tenths as f32 + KELVIN_OFFSET)
    }

    /// Oil pressure in Pascal.
    pub fn oil_pressure_pa(&mut self) -> Reading {
        let res = self.adc.read_raw(AdcChannel::OilSensor).and_then(|raw| {
            OIL_SENDER_10BAR
                .lookup(raw)
                .map(|kpa| kpa as f32 * 1000.0)
                .ok_or(SensorError::Disconnected { code: raw })
        });
        Reading::from_result(res)
    }

    /// Fuel level as a percentage of capacity, clamped to 0..100.
    pub fn fuel_level_pct(&mut self) -> Reading {
        let res = self.adc.read_raw(AdcChannel::FuelSensor).map(|raw| {
            // Sender resistances drift out of spec; clamp rather than trust.
            (100.0 * raw as f32 / FUEL_ADC_FULL).clamp(0.0, 100.0)
        });
        Reading::from_result(res)
    }

    /// Usable fuel capacity in litres.
    pub fn fuel_capacity_l(&self) -> f32 {
        FUEL_CAPACITY_L
    }

    /// Battery or alternator voltage in volts.
    pub fn voltage_v(&mut self, channel: AdcChannel) -> Reading {
        let res = self
            .adc
            .read_raw(channel)
            .map(|raw| raw as f32 * self.vdd / ADC_FULL_SCALE * VOLTAGE_DIVIDER_RATIO);
        Reading::from_result(res)
    }
}

//! ADC and Sender Calibration Constants
//!
//! Board-level facts about the analog front end: divider ratios, reference
//! codes, and fault cutoffs. Curve shapes live in [`crate::calibration`].

/// Coolant-sender supply reading that corresponds to a 12V supply.
///
/// The supply is measured through a 470k/100k divider: 12V ⇒ 3.84V at the
/// pin, calibrated on the reference board to a code of 780. Live coolant
/// readings are rescaled to this reference so the curve holds when the
/// supply sags.
pub const COOLANT_SUPPLY_ADC_12V: u16 = 780;

/// Minimum supply code for a trustworthy coolant reading.
///
/// Below ~4V on the sender supply the divider output is in the noise;
/// report "not available" rather than a fictitious temperature.
pub const MIN_SUPPLY_ADC: u16 = 261;

/// ADC full-scale count.
pub const ADC_FULL_SCALE: f32 = 1024.0;

/// Voltage divider ratio on the battery/alternator inputs.
///
/// Chosen so that code × (Vdd/1024) × ratio reproduces the bench-measured
/// 0.0151V/count at the nominal 4.67V Vdd.
pub const VOLTAGE_DIVIDER_RATIO: f32 = 3.3107;

/// Fuel sender code at a full tank.
///
/// European 0-190Ω sender behind a 1k resistor and series diode;
/// (5 - 0.63) × 190 / 1190 ⇒ code 142 when full, 0 when empty.
pub const FUEL_ADC_FULL: f32 = 142.0;

/// Usable fuel capacity reported alongside the level (litres).
pub const FUEL_CAPACITY_L: f32 = 60.0;

/// Celsius offset for Kelvin conversion.
pub const KELVIN_OFFSET: f32 = 273.15;

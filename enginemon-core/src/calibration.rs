//! Piecewise-Linear Calibration Curves
//!
//! ## Motivation
//!
//! The analog senders on an engine are wildly non-linear: a thermistor's
//! resistance falls roughly exponentially with temperature, and the coolant
//! sender sits in a voltage divider on an unregulated supply. Solving the
//! Steinhart-Hart equation per reading costs thousands of cycles on an MCU
//! without an FPU. Instead each sensor carries a small table of control
//! points measured (or computed offline) for that exact sender and divider,
//! and readings are linearly interpolated between bracketing points.
//!
//! ## Table Design
//!
//! A curve is an ordered sequence of raw ADC codes with a fixed step between
//! successive *outputs*. Storing only the codes keeps a 34-point curve at
//! 68 bytes. The code sequence is monotonic in the direction matching the
//! sensor: NTC thermistors give *descending* codes for increasing
//! temperature, the resistive oil sender gives *ascending* codes for
//! increasing pressure. Codes beyond either end clamp to the curve's stated
//! minimum/maximum output.
//!
//! ## Disconnected Senders
//!
//! An unplugged NTC floats to the pull-up rail and reads near full scale.
//! That code region is *not* a cold reading - curves with a disconnect
//! threshold short-circuit to `None` before interpolation, and callers
//! propagate "not available" instead of a numeric guess.

// Macro for optional logging
#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {{}};
}

/// A monotonic raw-code → scaled-output calibration curve.
///
/// Outputs run from `output_min` at `codes[0]` to `output_max` at
/// `codes[len-1]` in steps of `step`. Output units (degrees, tenths of a
/// degree, kilopascal) are whatever the curve was measured in; conversion
/// to SI happens in the sensor layer.
#[derive(Debug, Clone, Copy)]
pub struct Curve {
    /// Output at the first control point; also the clamp for codes past it.
    output_min: i16,
    /// Output at the last control point; also the clamp for codes past it.
    output_max: i16,
    /// Output step between successive control points.
    step: i16,
    /// Raw ADC codes, one per control point, strictly monotonic.
    codes: &'static [i16],
    /// Codes at or above this mean the sender is not connected.
    disconnect_above: Option<i16>,
}

impl Curve {
    /// Define a curve over `codes` with outputs `output_min..=output_max`.
    pub const fn new(
        output_min: i16,
        output_max: i16,
        step: i16,
        codes: &'static [i16],
        disconnect_above: Option<i16>,
    ) -> Self {
        Self {
            output_min,
            output_max,
            step,
            codes,
            disconnect_above,
        }
    }

    /// Interpolate a raw code into the curve's output units.
    ///
    /// Returns `None` for a disconnected sender. Codes beyond either end of
    /// the table clamp to `output_min`/`output_max`.
    pub fn lookup(&self, code: u16) -> Option<i16> {
        if let Some(limit) = self.disconnect_above {
            if code as i32 >= limit as i32 {
                return None;
            }
        }
        let reading = code as i32;
        Some(if self.is_descending() {
            self.interpolate_descending(reading)
        } else {
            self.interpolate_ascending(reading)
        })
    }

    fn is_descending(&self) -> bool {
        self.codes[0] > self.codes[self.codes.len() - 1]
    }

    // Descending codes: larger reading means smaller output.
    fn interpolate_descending(&self, reading: i32) -> i16 {
        let mut prev = self.codes[0] as i32;
        if reading > prev {
            log_warn!("curve input {} clamped to minimum output", reading);
            return self.output_min;
        }
        for (i, &code) in self.codes.iter().enumerate().skip(1) {
            let code = code as i32;
            if reading > code {
                let base = self.output_min as i32 + (i as i32 - 1) * self.step as i32;
                let frac = (prev - reading) * self.step as i32 / (prev - code);
                return (base + frac) as i16;
            }
            prev = code;
        }
        self.output_max
    }

    fn interpolate_ascending(&self, reading: i32) -> i16 {
        let mut prev = self.codes[0] as i32;
        if reading < prev {
            log_warn!("curve input {} clamped to minimum output", reading);
            return self.output_min;
        }
        for (i, &code) in self.codes.iter().enumerate().skip(1) {
            let code = code as i32;
            if reading < code {
                let base = self.output_min as i32 + (i as i32 - 1) * self.step as i32;
                let frac = (reading - prev) * self.step as i32 / (code - prev);
                return (base + frac) as i16;
            }
            prev = code;
        }
        self.output_max
    }
}

/// Volvo Penta standard coolant sender behind a 1k top resistor.
///
/// Codes computed for a 12V sensor supply through the 470k/100k divider;
/// the sensor layer rescales the live reading to the 12V reference before
/// lookup. Output in whole °C, 10..120 in 10° steps.
pub const COOLANT_SENDER: Curve = Curve::new(
    10,
    120,
    10,
    &[1274, 992, 750, 554, 404, 290, 217, 161, 119, 90, 69, 53],
    None,
);

/// MF52 10kΩ NTC with a 4k7 top resistor on the 5V rail.
///
/// Output in tenths of °C, -20.0..145.0 in 0.5° table steps (step value 50
/// tenths per point). Codes ≥ 1000 mean no NTC is plugged in.
pub const NTC_MF52_10K: Curve = Curve::new(
    -200,
    1450,
    50,
    &[
        980, 966, 948, 925, 898, 867, 831, 790, 745, 697, 646, 594, 543, 492, 443, 397, 354, 315,
        279, 247, 218, 192, 170, 150, 132, 117, 104, 92, 82, 73, 65, 58, 52, 46,
    ],
    Some(1000),
);

/// 10-bar resistive oil pressure sender, ascending codes.
///
/// Output in kPa, 0..1000 in 100kPa steps. Near-full-scale codes mean the
/// sender wiring is open.
pub const OIL_SENDER_10BAR: Curve = Curve::new(
    0,
    1000,
    100,
    &[82, 164, 243, 319, 392, 462, 529, 593, 654, 712, 767],
    Some(1000),
);

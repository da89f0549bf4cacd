//! Persisted Engine Configuration
//!
//! One small block holding the engine-hours accumulator and the ADC
//! reference calibration. The hours counter is stored as whole accrual
//! periods rather than seconds so the periodic save changes at most one
//! or two bytes per tick.

use crate::constants::storage::{
    CONFIG_BLOCK_LEN, CONFIG_BLOCK_OFFSET, CONFIG_HOURS_OFFSET, CONFIG_VDD_OFFSET,
    DEFAULT_VDD_SCALE, VDD_SCALE_DIVISOR,
};
use crate::constants::time::SECONDS_PER_HOURS_TICK;
use crate::errors::StorageResult;

use super::backend::NvBackend;
use super::block::{read_u16_le, read_u32_le, write_u16_le, write_u32_le, BlockStore, CRC_LEN};

const PAYLOAD_LEN: usize = CONFIG_BLOCK_LEN - CRC_LEN;

/// Decoded configuration block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Accrued running time in whole accrual periods.
    pub hours_periods: u32,
    /// ADC reference voltage in units of 1/10000 V.
    pub vdd_scale: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hours_periods: 0,
            vdd_scale: DEFAULT_VDD_SCALE,
        }
    }
}

impl EngineConfig {
    /// Accrued running time in seconds.
    pub fn engine_seconds(&self) -> u32 {
        self.hours_periods * SECONDS_PER_HOURS_TICK
    }

    /// Overwrite the accrued running time, rounding down to a whole
    /// accrual period.
    pub fn set_engine_seconds(&mut self, seconds: u32) {
        self.hours_periods = seconds / SECONDS_PER_HOURS_TICK;
    }

    /// ADC reference voltage in volts.
    pub fn vdd_volts(&self) -> f32 {
        self.vdd_scale as f32 / VDD_SCALE_DIVISOR
    }

    fn decode(payload: &[u8; PAYLOAD_LEN]) -> Self {
        let mut config = Self {
            hours_periods: read_u32_le(payload, CONFIG_HOURS_OFFSET),
            vdd_scale: read_u16_le(payload, CONFIG_VDD_OFFSET),
        };
        // A zero scale would silence every voltage channel; treat it as
        // never-calibrated.
        if config.vdd_scale == 0 {
            config.vdd_scale = DEFAULT_VDD_SCALE;
        }
        config
    }

    fn encode(&self) -> [u8; PAYLOAD_LEN] {
        let mut payload = [0u8; PAYLOAD_LEN];
        write_u32_le(&mut payload, CONFIG_HOURS_OFFSET, self.hours_periods);
        write_u16_le(&mut payload, CONFIG_VDD_OFFSET, self.vdd_scale);
        payload
    }
}

impl<B: NvBackend> BlockStore<B> {
    /// Load the configuration block, falling back to defaults when the
    /// stored copy fails its CRC.
    pub fn load_config(&self) -> StorageResult<EngineConfig> {
        let mut payload = [0u8; PAYLOAD_LEN];
        let valid = self.load_block(CONFIG_BLOCK_OFFSET, &mut payload)?;
        Ok(if valid {
            EngineConfig::decode(&payload)
        } else {
            log_warn!("config block failed CRC, using defaults");
            EngineConfig::default()
        })
    }

    /// Persist the configuration block.
    pub fn save_config(&mut self, config: &EngineConfig) -> StorageResult<()> {
        self.store_block(CONFIG_BLOCK_OFFSET, &config.encode())
    }
}

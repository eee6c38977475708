use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::calibration::BoardVersion;
use crate::error::MpptError;
use crate::sweep::{Objective, SweepConfig};

// ** SWEEP CONFIGURATION ** //

pub const OBJECTIVE: Objective = Objective::MaximizePower;
/// Duty cycle range swept on every trigger, inclusive.
pub const DUTY_MIN: f64 = 0.025;
pub const DUTY_MAX: f64 = 0.975;
pub const DUTY_STEP: f64 = 0.025;
/// Wait after each duty change before sampling.
pub const SETTLE_DELAY_MS: u64 = 50;
/// Steps delivering this much output power or less are never selected (watts).
pub const POWER_THRESHOLD_W: f64 = 1.0;
/// Upper bound on the steps in one sweep.
pub const MAX_SWEEP_STEPS: usize = 1000;

// ** TIMING CONFIGURATION ** //

pub const TRIGGER_INTERVAL_MS: u64 = 10_000;
/// Sampling period while holding an operating point.
pub const HOLD_INTERVAL_MS: u64 = 50;
/// Sweep immediately at startup instead of waiting for the first trigger.
pub const SWEEP_ON_START: bool = true;

// ** ACTUATOR CONFIGURATION ** //

/// Hardware PWM channel, 0 (GPIO 12/18) or 1 (GPIO 13/19)
pub const PWM_CHANNEL: u8 = 0;
pub const PWM_FREQUENCY_HZ: f64 = 21_000.0;
/// The v3.3.x gate drivers switch on while the PWM line is low.
pub const ACTUATOR_POLARITY_INVERTED: bool = true;
/// Duty cycle held before the first sweep and after a sweep finds nothing.
pub const SAFE_DUTY_CYCLE: f64 = 0.0;

// ** SENSOR CONFIGURATION ** //

pub const BOARD_VERSION: &str = "3.3.0";
/// ADS1115 with ADDR tied to GND
pub const ADC_ADDRESS: u16 = 0x48;
/// Sense amplifier full-scale output, maps to a raw sample of 1.0
pub const ADC_REFERENCE_VOLTS: f64 = 3.3;

/// Runtime configuration, loaded from a JSON file.
///
/// Missing keys fall back to the constants above; unknown keys are rejected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub objective: Objective,
    pub duty_min: f64,
    pub duty_max: f64,
    pub duty_step: f64,
    pub settle_delay_ms: u64,
    pub power_threshold: f64,
    pub trigger_interval_ms: u64,
    pub hold_interval_ms: u64,
    pub sweep_on_start: bool,
    pub pwm_channel: u8,
    pub pwm_frequency_hz: f64,
    pub actuator_polarity_inverted: bool,
    pub safe_duty_cycle: f64,
    pub board_version: String,
    pub adc_address: u16,
    pub adc_reference_volts: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            objective: OBJECTIVE,
            duty_min: DUTY_MIN,
            duty_max: DUTY_MAX,
            duty_step: DUTY_STEP,
            settle_delay_ms: SETTLE_DELAY_MS,
            power_threshold: POWER_THRESHOLD_W,
            trigger_interval_ms: TRIGGER_INTERVAL_MS,
            hold_interval_ms: HOLD_INTERVAL_MS,
            sweep_on_start: SWEEP_ON_START,
            pwm_channel: PWM_CHANNEL,
            pwm_frequency_hz: PWM_FREQUENCY_HZ,
            actuator_polarity_inverted: ACTUATOR_POLARITY_INVERTED,
            safe_duty_cycle: SAFE_DUTY_CYCLE,
            board_version: BOARD_VERSION.to_owned(),
            adc_address: ADC_ADDRESS,
            adc_reference_volts: ADC_REFERENCE_VOLTS,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MpptError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, MpptError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise use the built-in defaults.
    pub fn load_or_default(path: Option<&str>) -> Result<Self, MpptError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), MpptError> {
        self.sweep_config()?;
        self.board()?;

        if self.trigger_interval_ms == 0 {
            return Err(MpptError::InvalidConfig(
                "trigger_interval_ms must be positive".into(),
            ));
        }
        if !(self.pwm_frequency_hz > 0.0) {
            return Err(MpptError::InvalidConfig(format!(
                "pwm_frequency_hz must be positive, got {}",
                self.pwm_frequency_hz
            )));
        }
        if !(0.0..=1.0).contains(&self.safe_duty_cycle) {
            return Err(MpptError::InvalidConfig(format!(
                "safe_duty_cycle must be within [0, 1], got {}",
                self.safe_duty_cycle
            )));
        }
        if !(self.adc_reference_volts > 0.0) {
            return Err(MpptError::InvalidConfig(format!(
                "adc_reference_volts must be positive, got {}",
                self.adc_reference_volts
            )));
        }
        Ok(())
    }

    pub fn sweep_config(&self) -> Result<SweepConfig, MpptError> {
        SweepConfig::new(
            self.duty_min,
            self.duty_max,
            self.duty_step,
            Duration::from_millis(self.settle_delay_ms),
            self.power_threshold,
        )
    }

    pub fn board(&self) -> Result<BoardVersion, MpptError> {
        self.board_version.parse()
    }

    pub fn trigger_interval(&self) -> Duration {
        Duration::from_millis(self.trigger_interval_ms)
    }

    pub fn hold_interval(&self) -> Duration {
        Duration::from_millis(self.hold_interval_ms)
    }

    pub fn pwm_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.pwm_frequency_hz)
    }
}

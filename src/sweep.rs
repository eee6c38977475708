use std::fmt;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::MAX_SWEEP_STEPS;
use crate::error::MpptError;
use crate::telemetry::Reading;

/// Absorbs rounding in `(duty_max - duty_min) / duty_step` so that a range
/// which is an exact multiple of the step includes its upper end.
const STEP_COUNT_EPSILON: f64 = 1e-9;

/// What a sweep optimizes for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    #[serde(rename = "power")]
    MaximizePower,
    #[serde(rename = "efficiency")]
    MaximizeEfficiency,
}

impl Objective {
    /// Score a reading, or `None` if it cannot be an operating point.
    ///
    /// A reading is viable only when its output power exceeds
    /// `power_threshold`; efficiency scoring also needs non-zero input power.
    pub fn score(&self, reading: &Reading, power_threshold: f64) -> Option<f64> {
        let output_power = reading.output_power();
        if !(output_power > power_threshold) {
            return None;
        }

        match self {
            Objective::MaximizePower => Some(output_power),
            Objective::MaximizeEfficiency => reading.efficiency().filter(|e| e.is_finite()),
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Objective::MaximizePower => write!(f, "power"),
            Objective::MaximizeEfficiency => write!(f, "efficiency"),
        }
    }
}

/// Range and timing of one duty-cycle sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepConfig {
    duty_min: f64,
    duty_max: f64,
    duty_step: f64,
    settle_delay: Duration,
    power_threshold: f64,
}

impl SweepConfig {
    pub fn new(
        duty_min: f64,
        duty_max: f64,
        duty_step: f64,
        settle_delay: Duration,
        power_threshold: f64,
    ) -> Result<Self, MpptError> {
        if !(0.0..1.0).contains(&duty_min) {
            return Err(MpptError::InvalidSweep(format!(
                "duty_min {} outside [0, 1)",
                duty_min
            )));
        }
        if !(duty_max > 0.0 && duty_max <= 1.0) {
            return Err(MpptError::InvalidSweep(format!(
                "duty_max {} outside (0, 1]",
                duty_max
            )));
        }
        if duty_min >= duty_max {
            return Err(MpptError::InvalidSweep(format!(
                "duty_min {} not below duty_max {}",
                duty_min, duty_max
            )));
        }
        if !(duty_step > 0.0) {
            return Err(MpptError::InvalidSweep(format!(
                "duty_step {} must be positive",
                duty_step
            )));
        }
        if !(power_threshold >= 0.0) {
            return Err(MpptError::InvalidSweep(format!(
                "power_threshold {} must not be negative",
                power_threshold
            )));
        }

        // Checked as a float so a tiny step cannot saturate the step count.
        let span = (duty_max - duty_min) / duty_step + STEP_COUNT_EPSILON;
        if !(span.is_finite() && span < MAX_SWEEP_STEPS as f64) {
            return Err(MpptError::InvalidSweep(format!(
                "duty_step {} gives more than {} steps",
                duty_step, MAX_SWEEP_STEPS
            )));
        }

        Ok(Self {
            duty_min,
            duty_max,
            duty_step,
            settle_delay,
            power_threshold,
        })
    }

    pub fn duty_min(&self) -> f64 {
        self.duty_min
    }

    pub fn duty_max(&self) -> f64 {
        self.duty_max
    }

    pub fn duty_step(&self) -> f64 {
        self.duty_step
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    pub fn power_threshold(&self) -> f64 {
        self.power_threshold
    }

    /// Number of duty cycles visited: `floor((max - min) / step) + 1`.
    pub fn step_count(&self) -> usize {
        let span = (self.duty_max - self.duty_min) / self.duty_step;
        (span + STEP_COUNT_EPSILON).floor() as usize + 1
    }

    /// Duty cycles of a sweep in ascending order.
    ///
    /// Each is computed from its index so rounding does not accumulate.
    pub fn duty_cycles(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.step_count())
            .map(move |i| (self.duty_min + i as f64 * self.duty_step).min(self.duty_max))
    }

    /// Worst-case time a sweep blocks the caller.
    pub fn duration(&self) -> Duration {
        self.settle_delay * self.step_count() as u32
    }
}

/// One visited step of a sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepSample {
    pub duty_cycle: f64,
    pub reading: Reading,
}

impl fmt::Display for SweepSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DUTY: {:.4}, {}", self.duty_cycle, self.reading)
    }
}

/// Outcome of one sweep.
///
/// When no step was viable, `best_duty_cycle` and `best_score` stay at 0.0.
#[derive(Clone, Debug, PartialEq)]
pub struct SweepResult {
    pub best_duty_cycle: f64,
    pub best_score: f64,
    pub samples: Vec<SweepSample>,
}

impl SweepResult {
    /// Whether any step beat the "nothing found" score of 0.0.
    pub fn is_viable(&self) -> bool {
        self.best_score > 0.0
    }
}

/// Sweep the duty cycle across `config`'s range and pick the best step.
///
/// Every duty cycle in the range is applied through `set_duty` in ascending
/// order, so the converter output makes excursions across the whole range
/// while this runs. Blocks for `config.duration()` and cannot be cancelled.
/// The first step reaching the best score wins ties.
pub fn run_sweep(
    config: &SweepConfig,
    objective: Objective,
    mut set_duty: impl FnMut(f64),
    mut sample: impl FnMut() -> Reading,
) -> SweepResult {
    let mut result = SweepResult {
        best_duty_cycle: 0.0,
        best_score: 0.0,
        samples: Vec::with_capacity(config.step_count()),
    };

    for duty_cycle in config.duty_cycles() {
        set_duty(duty_cycle);
        if !config.settle_delay.is_zero() {
            thread::sleep(config.settle_delay);
        }
        let reading = sample();

        let step = SweepSample {
            duty_cycle,
            reading,
        };
        log::info!("{}", step);

        if let Some(score) = objective.score(&reading, config.power_threshold)
            && score > result.best_score
        {
            result.best_duty_cycle = duty_cycle;
            result.best_score = score;
        }

        result.samples.push(step);
    }

    log::debug!(
        "Sweep done: best {} {:.4} at duty {:.4} over {} steps",
        objective,
        result.best_score,
        result.best_duty_cycle,
        result.samples.len()
    );
    result
}

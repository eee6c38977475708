use std::thread;
use std::time::Duration;

use crate::actuator::Actuator;
use crate::config::Config;
use crate::error::MpptError;
use crate::sweep::{Objective, SweepConfig, SweepResult, SweepSample, run_sweep};
use crate::telemetry::{Acquisition, Reading, TelemetrySampler};
use crate::trigger::SweepRequest;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControllerState {
    /// Applying a chosen duty cycle between sweeps.
    Holding { duty_cycle: f64 },
    Sweeping,
}

/// What one control-loop iteration did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Iteration {
    Swept {
        best_duty_cycle: f64,
        best_score: f64,
        viable: bool,
    },
    Held(Reading),
}

/// Tunables of the operating-point controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControllerSettings {
    pub sweep: SweepConfig,
    pub objective: Objective,
    /// Applied at startup and whenever a sweep finds no viable point.
    pub safe_duty_cycle: f64,
    pub hold_interval: Duration,
}

impl ControllerSettings {
    pub fn from_config(config: &Config) -> Result<Self, MpptError> {
        Ok(Self {
            sweep: config.sweep_config()?,
            objective: config.objective,
            safe_duty_cycle: config.safe_duty_cycle,
            hold_interval: config.hold_interval(),
        })
    }
}

/// Sweeps the converter when asked and holds the best duty cycle between
/// sweeps.
///
/// The controller owns all of its state except the pending-sweep flag, which
/// the trigger raises and the controller alone clears.
pub struct OperatingPointController<A, P> {
    sampler: TelemetrySampler<A>,
    actuator: P,
    settings: ControllerSettings,
    request: SweepRequest,
    state: ControllerState,
    last_sweep: Option<SweepResult>,
    sweeps_completed: u64,
}

impl<A: Acquisition, P: Actuator> OperatingPointController<A, P> {
    pub fn new(
        sampler: TelemetrySampler<A>,
        mut actuator: P,
        settings: ControllerSettings,
        request: SweepRequest,
    ) -> Self {
        let duty_cycle = settings.safe_duty_cycle;
        actuator.set_duty(duty_cycle);

        Self {
            sampler,
            actuator,
            settings,
            request,
            state: ControllerState::Holding { duty_cycle },
            last_sweep: None,
            sweeps_completed: 0,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Logical duty cycle currently held, `None` mid-sweep.
    pub fn applied_duty_cycle(&self) -> Option<f64> {
        match self.state {
            ControllerState::Holding { duty_cycle } => Some(duty_cycle),
            ControllerState::Sweeping => None,
        }
    }

    pub fn last_sweep(&self) -> Option<&SweepResult> {
        self.last_sweep.as_ref()
    }

    pub fn sweeps_completed(&self) -> u64 {
        self.sweeps_completed
    }

    pub fn request(&self) -> &SweepRequest {
        &self.request
    }

    /// Run one control-loop iteration.
    ///
    /// Consumes a pending sweep request and sweeps to completion, otherwise
    /// samples once at the held operating point. Requests raised during a
    /// sweep stay pending for the next call.
    pub fn step(&mut self) -> Iteration {
        let duty_cycle = match self.state {
            ControllerState::Holding { duty_cycle } => duty_cycle,
            // `sweep` returns to Holding before it hands back control.
            ControllerState::Sweeping => unreachable!("step called mid-sweep"),
        };

        if self.request.take() {
            return self.sweep();
        }

        let reading = self.sampler.sample();
        log::info!(
            "{}",
            SweepSample {
                duty_cycle,
                reading
            }
        );
        Iteration::Held(reading)
    }

    /// Run the control loop forever.
    pub fn run(&mut self) -> ! {
        loop {
            if let Iteration::Held(_) = self.step() {
                thread::sleep(self.settings.hold_interval);
            }
        }
    }

    fn sweep(&mut self) -> Iteration {
        log::info!("SWEEP");
        self.state = ControllerState::Sweeping;

        let actuator = &mut self.actuator;
        let sampler = &mut self.sampler;
        let result = run_sweep(
            &self.settings.sweep,
            self.settings.objective,
            |duty| actuator.set_duty(duty),
            || sampler.sample(),
        );

        let viable = result.is_viable();
        let duty_cycle = if viable {
            result.best_duty_cycle
        } else {
            log::warn!(
                "No step above {:.3} W, holding safe duty cycle {:.4}",
                self.settings.sweep.power_threshold(),
                self.settings.safe_duty_cycle
            );
            self.settings.safe_duty_cycle
        };

        self.actuator.set_duty(duty_cycle);
        self.state = ControllerState::Holding { duty_cycle };
        self.sweeps_completed += 1;
        log::info!(
            "HOLD at duty {:.4} ({} {:.4})",
            duty_cycle,
            self.settings.objective,
            result.best_score
        );

        let iteration = Iteration::Swept {
            best_duty_cycle: result.best_duty_cycle,
            best_score: result.best_score,
            viable,
        };
        self.last_sweep = Some(result);
        iteration
    }
}

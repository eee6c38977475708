use std::time::Duration;

use rppal::pwm::{Channel, Polarity};

// Use rppal in production
#[cfg(not(test))]
use rppal::pwm::Pwm;

// Mock PWM for testing
#[cfg(test)]
use crate::mocks::mock_pwm::Pwm;

use crate::error::MpptError;

/// Sink for the converter's logical duty cycle.
///
/// Implementations absorb their own write failures; the control loop never
/// stops because an output update failed.
pub trait Actuator {
    fn set_duty(&mut self, duty_cycle: f64);
}

/// Duty cycle to write to the hardware for a logical duty cycle.
///
/// Some gate drivers invert the PWM signal, so the switch is on while the
/// output is low.
pub fn applied_duty(logical: f64, polarity_inverted: bool) -> f64 {
    let logical = logical.clamp(0.0, 1.0);
    if polarity_inverted {
        1.0 - logical
    } else {
        logical
    }
}

/// Hardware PWM gate drive.
pub struct PwmActuator {
    pwm: Pwm,
    period: Duration,
    polarity_inverted: bool,
}

impl PwmActuator {
    /// Open hardware PWM `channel` (0 or 1) at `frequency_hz`, starting at a
    /// logical duty cycle of `initial_duty`.
    pub fn new(
        channel: u8,
        frequency_hz: f64,
        polarity_inverted: bool,
        initial_duty: f64,
    ) -> Result<Self, MpptError> {
        let channel = match channel {
            0 => Channel::Pwm0,
            1 => Channel::Pwm1,
            other => return Err(MpptError::InvalidPwmChannel(other)),
        };

        let pwm = Pwm::with_frequency(
            channel,
            frequency_hz,
            applied_duty(initial_duty, polarity_inverted),
            Polarity::Normal,
            true, // enabled
        )?;

        let period = Duration::from_secs_f64(1.0 / frequency_hz);
        log::info!(
            "PWM {:?} at {:.0} Hz (period {} us), polarity {}",
            channel,
            frequency_hz,
            period.as_micros(),
            if polarity_inverted { "inverted" } else { "normal" }
        );

        Ok(Self {
            pwm,
            period,
            polarity_inverted,
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Disable PWM output
    pub fn disable(&mut self) -> Result<(), MpptError> {
        self.pwm.disable()?;
        Ok(())
    }
}

impl Actuator for PwmActuator {
    fn set_duty(&mut self, duty_cycle: f64) {
        let applied = applied_duty(duty_cycle, self.polarity_inverted);
        if let Err(e) = self.pwm.set_duty_cycle(applied) {
            log::error!("Failed to set PWM duty cycle {:.4}: {}", applied, e);
        }
    }
}

impl Drop for PwmActuator {
    fn drop(&mut self) {
        // Ensure PWM is disabled when dropped
        let _ = self.disable();
    }
}

// This file is only compiled during tests

use std::cell::RefCell;

use rppal::pwm::{Channel, Polarity, Result};

thread_local! {
    static MOCK_PWM_DUTY: RefCell<Vec<f64>> = const { RefCell::new(Vec::new()) };
    static MOCK_PWM_ENABLED: RefCell<bool> = const { RefCell::new(false) };
}

pub struct Pwm {
    channel: Channel,
}

impl Pwm {
    pub fn with_frequency(
        channel: Channel,
        frequency: f64,
        duty_cycle: f64,
        _polarity: Polarity,
        enabled: bool,
    ) -> Result<Self> {
        MOCK_PWM_DUTY.with(|duty| duty.borrow_mut().push(duty_cycle));
        MOCK_PWM_ENABLED.with(|state| *state.borrow_mut() = enabled);
        log::trace!("[Mock PWM {:?}] Enabled at {:.0} Hz", channel, frequency);
        Ok(Pwm { channel })
    }

    pub fn set_duty_cycle(&self, duty_cycle: f64) -> Result<()> {
        MOCK_PWM_DUTY.with(|duty| duty.borrow_mut().push(duty_cycle));
        log::trace!("[Mock PWM {:?}] Duty cycle set to {:.4}", self.channel, duty_cycle);
        Ok(())
    }

    pub fn disable(&self) -> Result<()> {
        MOCK_PWM_ENABLED.with(|state| *state.borrow_mut() = false);
        Ok(())
    }
}

// Test helpers

/// Last duty cycle written to the hardware.
pub fn get_mock_duty_cycle() -> Option<f64> {
    MOCK_PWM_DUTY.with(|duty| duty.borrow().last().copied())
}

/// Every duty cycle written since the last reset, oldest first.
pub fn mock_duty_history() -> Vec<f64> {
    MOCK_PWM_DUTY.with(|duty| duty.borrow().clone())
}

pub fn is_mock_pwm_enabled() -> bool {
    MOCK_PWM_ENABLED.with(|state| *state.borrow())
}

pub fn reset_mock_pwm() {
    MOCK_PWM_DUTY.with(|duty| duty.borrow_mut().clear());
    MOCK_PWM_ENABLED.with(|state| *state.borrow_mut() = false);
}

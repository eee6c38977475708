pub mod actuator;
pub mod adc;
pub mod calibration;
pub mod config;
pub mod controller;
pub mod error;
pub mod sweep;
pub mod telemetry;
pub mod trigger;

// Re-export commonly used types
pub use config::Config;
pub use controller::{ControllerState, Iteration, OperatingPointController};
pub use error::MpptError;
pub use sweep::{Objective, SweepConfig, SweepResult, run_sweep};
pub use telemetry::Reading;
pub use trigger::{SweepRequest, SweepTrigger};

#[cfg(test)]
pub(crate) mod mocks;

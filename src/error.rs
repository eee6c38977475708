use thiserror::Error;

/// Errors raised while bringing the controller up.
///
/// The running control loop never surfaces these: once the
/// hardware is open, failed reads and writes are logged and absorbed.
#[derive(Debug, Error)]
pub enum MpptError {
    #[error("PWM error: {0}")]
    Pwm(#[from] rppal::pwm::Error),
    #[error("I2C error: {0}")]
    I2c(#[from] rppal::i2c::Error),
    #[error("config file error: {0}")]
    ConfigIo(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("invalid sweep configuration: {0}")]
    InvalidSweep(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unknown board version {0:?}, expected one of 3.2.0, 3.3.0, 3.3.1")]
    UnknownBoard(String),
    #[error("invalid PWM channel {0}, use 0 or 1")]
    InvalidPwmChannel(u8),
    #[error("failed to start sweep trigger thread: {0}")]
    TriggerSpawn(#[source] std::io::Error),
    #[error("ADC conversion on input {0} did not complete")]
    AdcTimeout(u8),
}

// Hardware doubles swapped in for rppal types when testing.

pub mod mock_i2c;
pub mod mock_pwm;

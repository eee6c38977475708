use std::thread;
use std::time::Duration;

// Use rppal in production
#[cfg(not(test))]
use rppal::i2c::I2c;

// Mock I2C for testing
#[cfg(test)]
use crate::mocks::mock_i2c::I2c;

use crate::error::MpptError;
use crate::telemetry::Acquisition;

// ADS1115 register addresses
const CONVERSION_REG: u8 = 0x00;
const CONFIG_REG: u8 = 0x01;

// Config register fields
const OS_START: u16 = 0x8000; // Start a single conversion / conversion done when read
const MUX_SINGLE_AIN0: u16 = 0b100 << 12; // AINx vs GND, add the input index
const PGA_4_096V: u16 = 0b001 << 9;
const MODE_SINGLE_SHOT: u16 = 1 << 8;
const DR_860_SPS: u16 = 0b111 << 5;
const COMP_DISABLE: u16 = 0b11;

/// Full-scale voltage selected by `PGA_4_096V`.
const FULL_SCALE_VOLTS: f64 = 4.096;

/// One conversion at 860 SPS takes ~1.2 ms.
const READY_POLL_INTERVAL: Duration = Duration::from_micros(500);
const READY_POLL_ATTEMPTS: u32 = 20;

/// Four-input ADS1115 ADC on the Linux I2C bus.
///
/// Samples are normalized against `reference_volts` (the sense amplifiers'
/// full-scale output) and clamped to [0, 1].
pub struct Ads1115Adc {
    i2c: I2c,
    reference_volts: f64,
}

impl Ads1115Adc {
    pub fn new(address: u16, reference_volts: f64) -> Result<Self, MpptError> {
        let mut i2c = I2c::new()?;
        i2c.set_slave_address(address)?;

        log::info!("ADS1115 opened at 0x{:02X}", address);
        Ok(Self {
            i2c,
            reference_volts,
        })
    }

    /// Run one single-shot conversion on `input` (0..=3) and return the
    /// signed conversion code.
    pub fn read_code(&mut self, input: u8) -> Result<i16, MpptError> {
        let config = OS_START
            | (MUX_SINGLE_AIN0 + ((input as u16 & 0x03) << 12))
            | PGA_4_096V
            | MODE_SINGLE_SHOT
            | DR_860_SPS
            | COMP_DISABLE;
        let [hi, lo] = config.to_be_bytes();
        self.i2c.write(&[CONFIG_REG, hi, lo])?;

        let mut word = [0u8; 2];
        let mut ready = false;
        for _ in 0..READY_POLL_ATTEMPTS {
            self.i2c.write_read(&[CONFIG_REG], &mut word)?;
            if u16::from_be_bytes(word) & OS_START != 0 {
                ready = true;
                break;
            }
            thread::sleep(READY_POLL_INTERVAL);
        }
        if !ready {
            return Err(MpptError::AdcTimeout(input));
        }

        self.i2c.write_read(&[CONVERSION_REG], &mut word)?;
        Ok(i16::from_be_bytes(word))
    }

    /// Map a conversion code onto the normalized [0, 1] domain.
    pub fn normalize(&self, code: i16) -> f64 {
        let volts = code as f64 * FULL_SCALE_VOLTS / 32768.0;
        (volts / self.reference_volts).clamp(0.0, 1.0)
    }
}

impl Acquisition for Ads1115Adc {
    fn read_raw(&mut self, input: u8) -> f64 {
        match self.read_code(input) {
            Ok(code) => self.normalize(code),
            Err(e) => {
                log::warn!("ADC read on input {} failed: {}", input, e);
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::mock_i2c;

    #[test]
    fn test_single_shot_config_selects_input() -> Result<(), MpptError> {
        mock_i2c::reset_mock_i2c();
        let mut adc = Ads1115Adc::new(0x48, 3.3)?;

        adc.read_code(2)?;
        let config = mock_i2c::last_mock_config();
        assert_eq!((config >> 12) & 0x07, 0b110);
        assert_eq!(config & MODE_SINGLE_SHOT, MODE_SINGLE_SHOT);

        Ok(())
    }

    #[test]
    fn test_read_raw_normalizes_against_reference() -> Result<(), MpptError> {
        mock_i2c::reset_mock_i2c();
        // 1.65 V on a 4.096 V full scale
        mock_i2c::set_mock_conversion(1, (1.65 / FULL_SCALE_VOLTS * 32768.0) as i16);
        let mut adc = Ads1115Adc::new(0x48, 3.3)?;

        let raw = adc.read_raw(1);
        assert!((raw - 0.5).abs() < 1e-3);

        Ok(())
    }

    #[test]
    fn test_read_raw_clamps_to_unit_range() -> Result<(), MpptError> {
        mock_i2c::reset_mock_i2c();
        mock_i2c::set_mock_conversion(0, -1200);
        mock_i2c::set_mock_conversion(3, i16::MAX);
        let mut adc = Ads1115Adc::new(0x48, 3.3)?;

        assert_eq!(adc.read_raw(0), 0.0);
        assert_eq!(adc.read_raw(3), 1.0);

        Ok(())
    }

    #[test]
    fn test_bus_failure_reads_as_zero() -> Result<(), MpptError> {
        mock_i2c::reset_mock_i2c();
        mock_i2c::set_mock_conversion(0, 20000);
        let mut adc = Ads1115Adc::new(0x48, 3.3)?;

        mock_i2c::set_mock_failure(true);
        assert_eq!(adc.read_raw(0), 0.0);
        assert!(matches!(adc.read_code(0), Err(MpptError::I2c(_))));

        Ok(())
    }

    #[test]
    fn test_conversion_timeout() -> Result<(), MpptError> {
        mock_i2c::reset_mock_i2c();
        mock_i2c::set_mock_busy(true);
        let mut adc = Ads1115Adc::new(0x48, 3.3)?;

        assert!(matches!(adc.read_code(1), Err(MpptError::AdcTimeout(1))));
        assert_eq!(adc.read_raw(1), 0.0);

        Ok(())
    }
}

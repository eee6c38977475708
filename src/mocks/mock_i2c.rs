// This file is only compiled during tests
//
// Emulates just enough of an ADS1115 behind the I2C bus: the config register
// selects the input, the conversion register returns the code set by the test.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;

use rppal::i2c::{Error, Result};

struct MockAdc {
    conversions: HashMap<u8, i16>,
    selected_input: u8,
    last_config: u16,
    failing: bool,
    busy: bool,
}

thread_local! {
    static MOCK_ADC: RefCell<MockAdc> = RefCell::new(MockAdc {
        conversions: HashMap::new(),
        selected_input: 0,
        last_config: 0,
        failing: false,
        busy: false,
    });
}

pub struct I2c {
    address: u16,
}

impl I2c {
    pub fn new() -> Result<Self> {
        Ok(I2c { address: 0 })
    }

    pub fn set_slave_address(&mut self, address: u16) -> Result<()> {
        self.address = address;
        Ok(())
    }

    pub fn write(&mut self, buffer: &[u8]) -> Result<usize> {
        MOCK_ADC.with(|adc| {
            let mut adc = adc.borrow_mut();
            if adc.failing {
                return Err(Error::Io(io::Error::other("mock bus failure")));
            }
            if buffer.len() == 3 && buffer[0] == 0x01 {
                let config = u16::from_be_bytes([buffer[1], buffer[2]]);
                adc.last_config = config;
                adc.selected_input = (((config >> 12) & 0x07) as u8).saturating_sub(4);
                log::trace!("[Mock I2C 0x{:02X}] Config 0x{:04X}", self.address, config);
            }
            Ok(buffer.len())
        })
    }

    pub fn write_read(&mut self, write_buffer: &[u8], read_buffer: &mut [u8]) -> Result<()> {
        MOCK_ADC.with(|adc| {
            let adc = adc.borrow();
            if adc.failing {
                return Err(Error::Io(io::Error::other("mock bus failure")));
            }
            let word = match write_buffer.first() {
                Some(0x00) => *adc.conversions.get(&adc.selected_input).unwrap_or(&0) as u16,
                Some(0x01) if adc.busy => adc.last_config & 0x7FFF,
                Some(0x01) => adc.last_config | 0x8000,
                _ => 0,
            };
            read_buffer[..2].copy_from_slice(&word.to_be_bytes());
            Ok(())
        })
    }
}

// Test helpers

pub fn set_mock_conversion(input: u8, code: i16) {
    MOCK_ADC.with(|adc| {
        adc.borrow_mut().conversions.insert(input, code);
    });
}

pub fn set_mock_failure(failing: bool) {
    MOCK_ADC.with(|adc| adc.borrow_mut().failing = failing);
}

/// Keep the conversion-ready bit clear forever.
pub fn set_mock_busy(busy: bool) {
    MOCK_ADC.with(|adc| adc.borrow_mut().busy = busy);
}

pub fn last_mock_config() -> u16 {
    MOCK_ADC.with(|adc| adc.borrow().last_config)
}

pub fn reset_mock_i2c() {
    MOCK_ADC.with(|adc| {
        let mut adc = adc.borrow_mut();
        adc.conversions.clear();
        adc.selected_input = 0;
        adc.last_config = 0;
        adc.failing = false;
        adc.busy = false;
    });
}

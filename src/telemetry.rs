use std::fmt;

use crate::calibration::BoardProfile;

/// One calibrated snapshot of the converter's four sense channels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Reading {
    /// Volts
    pub input_voltage: f64,
    /// Amps
    pub input_current: f64,
    /// Volts
    pub output_voltage: f64,
    /// Amps
    pub output_current: f64,
}

impl Reading {
    pub fn new(
        input_voltage: f64,
        input_current: f64,
        output_voltage: f64,
        output_current: f64,
    ) -> Self {
        Self {
            input_voltage,
            input_current,
            output_voltage,
            output_current,
        }
    }

    pub fn input_power(&self) -> f64 {
        self.input_voltage * self.input_current
    }

    pub fn output_power(&self) -> f64 {
        self.output_voltage * self.output_current
    }

    /// Output over input power. `None` when no power flows in.
    pub fn efficiency(&self) -> Option<f64> {
        let input_power = self.input_power();
        if input_power == 0.0 {
            None
        } else {
            Some(self.output_power() / input_power)
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "INP: {:.3} V, {:.3} A, {:.3} W, OUT: {:.3} V, {:.3} A, {:.3} W, EFF: ",
            self.input_voltage,
            self.input_current,
            self.input_power(),
            self.output_voltage,
            self.output_current,
            self.output_power()
        )?;
        match self.efficiency() {
            Some(efficiency) => write!(f, "{:.4}", efficiency),
            None => write!(f, "n/a"),
        }
    }
}

/// Source of normalized analog samples.
///
/// `read_raw` returns the sample on ADC input `input`, already clamped to
/// [0, 1]. Implementations absorb their own read failures.
pub trait Acquisition {
    fn read_raw(&mut self, input: u8) -> f64;
}

/// Raw samples of the four channels, before calibration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawReading {
    pub input_voltage: f64,
    pub input_current: f64,
    pub output_voltage: f64,
    pub output_current: f64,
}

/// Reads the four channels of a board and calibrates them.
pub struct TelemetrySampler<A> {
    acquisition: A,
    profile: BoardProfile,
}

impl<A: Acquisition> TelemetrySampler<A> {
    pub fn new(acquisition: A, profile: BoardProfile) -> Self {
        Self {
            acquisition,
            profile,
        }
    }

    pub fn profile(&self) -> &BoardProfile {
        &self.profile
    }

    pub fn sample_raw(&mut self) -> RawReading {
        let channels = self.profile.channels;
        RawReading {
            input_voltage: self.acquisition.read_raw(channels.input_voltage),
            input_current: self.acquisition.read_raw(channels.input_current),
            output_voltage: self.acquisition.read_raw(channels.output_voltage),
            output_current: self.acquisition.read_raw(channels.output_current),
        }
    }

    pub fn calibrate(&self, raw: &RawReading) -> Reading {
        let cal = &self.profile.calibration;
        Reading {
            input_voltage: cal.input_voltage.apply(raw.input_voltage),
            input_current: cal.input_current.apply(raw.input_current),
            output_voltage: cal.output_voltage.apply(raw.output_voltage),
            output_current: cal.output_current.apply(raw.output_current),
        }
    }

    pub fn sample(&mut self) -> Reading {
        let raw = self.sample_raw();
        self.calibrate(&raw)
    }
}

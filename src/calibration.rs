use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MpptError;

/// Linear raw-to-physical mapping for one sense channel.
///
/// `physical = raw * gain + offset`, where `raw` is the normalized ADC
/// sample in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelCalibration {
    pub gain: f64,
    pub offset: f64,
}

impl ChannelCalibration {
    /// Passes the raw sample through unchanged.
    pub const IDENTITY: Self = Self {
        gain: 1.0,
        offset: 0.0,
    };

    pub const fn new(gain: f64, offset: f64) -> Self {
        Self { gain, offset }
    }

    #[inline]
    pub fn apply(&self, raw: f64) -> f64 {
        raw * self.gain + self.offset
    }

    /// Build a calibration from two bench measurements of (raw, physical).
    pub fn from_two_points(raw1: f64, physical1: f64, raw2: f64, physical2: f64) -> Self {
        let gain = (physical2 - physical1) / (raw2 - raw1);
        let offset = physical1 - gain * raw1;

        Self { gain, offset }
    }
}

impl Default for ChannelCalibration {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Calibration for the four sense channels of a board.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProfile {
    pub input_voltage: ChannelCalibration,
    pub input_current: ChannelCalibration,
    pub output_voltage: ChannelCalibration,
    pub output_current: ChannelCalibration,
}

impl CalibrationProfile {
    pub const IDENTITY: Self = Self {
        input_voltage: ChannelCalibration::IDENTITY,
        input_current: ChannelCalibration::IDENTITY,
        output_voltage: ChannelCalibration::IDENTITY,
        output_current: ChannelCalibration::IDENTITY,
    };
}

/// ADC input index wired to each logical channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMap {
    pub input_voltage: u8,
    pub input_current: u8,
    pub output_voltage: u8,
    pub output_current: u8,
}

/// Everything that differs between board revisions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoardProfile {
    pub calibration: CalibrationProfile,
    pub channels: ChannelMap,
}

/// Supported converter board revisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoardVersion {
    V3_2_0,
    V3_3_0,
    V3_3_1,
}

impl BoardVersion {
    pub fn profile(&self) -> BoardProfile {
        match self {
            // Output (battery) sense on the lower inputs, input (array) above.
            BoardVersion::V3_2_0 => BoardProfile {
                calibration: CalibrationProfile::IDENTITY,
                channels: ChannelMap {
                    output_current: 0,
                    output_voltage: 1,
                    input_current: 2,
                    input_voltage: 3,
                },
            },
            BoardVersion::V3_3_0 => BoardProfile {
                calibration: CalibrationProfile {
                    input_voltage: ChannelCalibration::new(114.108, 0.006),
                    input_current: ChannelCalibration::new(8.114754, 0.0),
                    output_voltage: ChannelCalibration::new(168.97, 0.067),
                    output_current: ChannelCalibration::new(8.247, 0.0),
                },
                channels: ChannelMap {
                    output_current: 0,
                    output_voltage: 1,
                    input_voltage: 2,
                    input_current: 3,
                },
            },
            // Not yet characterized on the bench.
            BoardVersion::V3_3_1 => BoardProfile {
                calibration: CalibrationProfile::IDENTITY,
                channels: ChannelMap {
                    input_voltage: 0,
                    input_current: 1,
                    output_current: 2,
                    output_voltage: 3,
                },
            },
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            BoardVersion::V3_2_0 => "3.2.0",
            BoardVersion::V3_3_0 => "3.3.0",
            BoardVersion::V3_3_1 => "3.3.1",
        }
    }
}

impl fmt::Display for BoardVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.as_str())
    }
}

impl FromStr for BoardVersion {
    type Err = MpptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('v') {
            "3.2.0" => Ok(BoardVersion::V3_2_0),
            "3.3.0" => Ok(BoardVersion::V3_3_0),
            "3.3.1" => Ok(BoardVersion::V3_3_1),
            _ => Err(MpptError::UnknownBoard(s.to_owned())),
        }
    }
}

//! Protocol commands
//!
//! Defines the readings the inverter can be asked for. Each reading maps to
//! a command code, a sub-command code and the shape its response payload is
//! decoded with.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ProtocolError;

/// Wire shape of a response payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decoder {
    /// Six ASCII characters, no status bytes
    Ascii6,
    /// Status bytes followed by a 2-character ASCII fragment
    AsciiWithState,
    /// Status bytes followed by a big-endian IEEE-754 float
    Float32,
    /// Status bytes followed by a big-endian unsigned integer
    Uint32,
    /// Status bytes followed by two 2-digit ASCII numbers
    WeekYear,
    /// Status bytes followed by seconds since 2000-01-01
    Timestamp,
    /// Status bytes followed by four alarm codes
    AlarmQuad,
}

/// Command parameters for a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    /// Protocol name, e.g. "gridV"
    pub name: &'static str,
    /// Command code (frame byte 1)
    pub command: u8,
    /// Sub-command code (frame byte 2)
    pub sub_command: u8,
    /// Shape of the response payload
    pub decoder: Decoder,
}

/// Command code for DSP measurements
pub const CMD_DSP: u8 = 59;

macro_rules! readings {
    ($($variant:ident => $name:literal, $cmd:literal, $sub:literal, $decoder:ident, $doc:literal;)+) => {
        /// A queryable inverter measurement or identity field
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum Reading {
            $(#[doc = $doc] $variant,)+
        }

        impl Reading {
            /// Every reading the protocol layer can request
            pub const ALL: &'static [Reading] = &[$(Reading::$variant,)+];

            /// Command parameters for this reading
            pub const fn spec(self) -> CommandSpec {
                match self {
                    $(Reading::$variant => CommandSpec {
                        name: $name,
                        command: $cmd,
                        sub_command: $sub,
                        decoder: Decoder::$decoder,
                    },)+
                }
            }
        }
    };
}

readings! {
    PartNumber      => "partNumber",      52,  0, Ascii6,         "Part number";
    Version         => "version",         58,  0, AsciiWithState, "Model and grid standard fragment";
    GridVoltage     => "gridV",           59,  1, Float32,        "Grid voltage (V)";
    GridCurrent     => "gridC",           59,  2, Float32,        "Grid current (A)";
    GridPower       => "gridP",           59,  3, Float32,        "Grid power (W)";
    Frequency       => "frequency",       59,  4, Float32,        "Grid frequency (Hz)";
    BulkVoltage     => "bulkV",           59,  5, Float32,        "Bulk capacitor voltage (V)";
    LeakDcCurrent   => "leakDcC",         59,  6, Float32,        "DC/DC leakage current (A)";
    LeakCurrent     => "leakC",           59,  7, Float32,        "Inverter leakage current (A)";
    String1Power    => "str1P",           59,  8, Float32,        "Input 1 power (W)";
    String2Power    => "str2P",           59,  9, Float32,        "Input 2 power (W)";
    InverterTemp    => "inverterT",       59, 21, Float32,        "Inverter temperature (°C)";
    BoosterTemp     => "boosterT",        59, 22, Float32,        "Booster temperature (°C)";
    String1Voltage  => "str1V",           59, 23, Float32,        "Input 1 voltage (V)";
    String1Current  => "str1C",           59, 25, Float32,        "Input 1 current (A)";
    String2Voltage  => "str2V",           59, 26, Float32,        "Input 2 voltage (V)";
    String2Current  => "str2C",           59, 27, Float32,        "Input 2 current (A)";
    GridDcVoltage   => "gridDcV",         59, 28, Float32,        "Grid voltage measured by the DC/DC stage (V)";
    GridDcFrequency => "gridDcFreq",      59, 29, Float32,        "Grid frequency measured by the DC/DC stage (Hz)";
    IsoResistance   => "isoR",            59, 30, Float32,        "Isolation resistance (MOhm)";
    BulkDcVoltage   => "bulkDcV",         59, 31, Float32,        "Bulk voltage measured by the DC/DC stage (V)";
    GridAvgVoltage  => "gridAvV",         59, 32, Float32,        "Average grid voltage (V)";
    BulkMidVoltage  => "bulkMidV",        59, 33, Float32,        "Bulk mid-point voltage (V)";
    GridNVoltage    => "gridNV",          59, 34, Float32,        "Grid neutral voltage (V)";
    DayPeakPower    => "dayPeakP",        59, 35, Float32,        "Peak power today (W)";
    PeakPower       => "peakP",           59, 36, Float32,        "All-time peak power (W)";
    GridNPhVoltage  => "gridNPhV",        59, 38, Float32,        "Grid neutral-to-phase voltage (V)";
    SerialNumber    => "serialNumber",    63,  0, Ascii6,         "Serial number";
    ManufactureDate => "manufactureDate", 65,  0, WeekYear,       "Manufacturing week and year";
    TimeDate        => "timeDate",        70,  0, Timestamp,      "Inverter clock";
    FirmwareRelease => "firmwareRelease", 72,  0, AsciiWithState, "Firmware release fragment";
    DayEnergy       => "dayEnergy",       78,  0, Uint32,         "Energy produced today (Wh)";
    WeekEnergy      => "weekEnergy",      78,  1, Uint32,         "Energy produced this week (Wh)";
    MonthEnergy     => "monthEnergy",     78,  3, Uint32,         "Energy produced this month (Wh)";
    YearEnergy      => "yearEnergy",      78,  4, Uint32,         "Energy produced this year (Wh)";
    TotalEnergy     => "totalEnergy",     78,  5, Uint32,         "Lifetime energy (Wh)";
    PartialEnergy   => "partialEnergy",   78,  6, Uint32,         "Energy since the partial counter was reset (Wh)";
    LastAlarms      => "lastAlarms",      86,  0, AlarmQuad,      "Last four alarm codes";
}

impl Reading {
    /// Protocol name of the reading (e.g. "gridV")
    pub const fn name(self) -> &'static str {
        self.spec().name
    }

    /// Look up a reading by its protocol name
    pub fn from_name(name: &str) -> Option<Reading> {
        Reading::ALL.iter().copied().find(|r| r.name() == name)
    }

    /// True for DSP measurements (command 59)
    pub fn is_dsp(self) -> bool {
        self.spec().command == CMD_DSP
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Reading {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Reading::from_name(s).ok_or_else(|| ProtocolError::UnknownReading(s.to_string()))
    }
}

/// Names of every supported reading, in registry order
pub fn supported_readings() -> impl Iterator<Item = &'static str> {
    Reading::ALL.iter().map(|r| r.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_unique() {
        let names: HashSet<_> = supported_readings().collect();
        assert_eq!(names.len(), Reading::ALL.len());
    }

    #[test]
    fn test_command_pairs_unique() {
        let pairs: HashSet<_> = Reading::ALL
            .iter()
            .map(|r| (r.spec().command, r.spec().sub_command))
            .collect();
        assert_eq!(pairs.len(), Reading::ALL.len());
    }

    #[test]
    fn test_lookup() {
        let spec = "gridV".parse::<Reading>().unwrap().spec();
        assert_eq!((spec.command, spec.sub_command), (59, 1));
        assert_eq!(spec.decoder, Decoder::Float32);

        assert_eq!(Reading::from_name("timeDate"), Some(Reading::TimeDate));
        assert_eq!(Reading::LastAlarms.spec().decoder, Decoder::AlarmQuad);
        assert_eq!(Reading::MonthEnergy.spec().sub_command, 3);
    }

    #[test]
    fn test_unknown_reading() {
        let err = "noSuchReading".parse::<Reading>().unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownReading(ref n) if n == "noSuchReading"));
    }

    #[test]
    fn test_display_roundtrip() {
        for reading in Reading::ALL {
            assert_eq!(reading.to_string().parse::<Reading>().unwrap(), *reading);
        }
    }

    #[test]
    fn test_dsp_group() {
        let dsp = Reading::ALL.iter().filter(|r| r.is_dsp()).count();
        assert_eq!(dsp, 25);
        assert!(!Reading::DayEnergy.is_dsp());
    }
}

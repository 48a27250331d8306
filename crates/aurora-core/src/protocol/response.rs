//! Decoded inverter responses
//!
//! An inverter response is 8 bytes on the wire:
//!
//! ```text
//! byte 0: transmission state
//! byte 1: global state
//! byte 2..6: data
//! byte 6..8: CRC (low, high)
//! ```
//!
//! Once the CRC is stripped the 6-byte payload is decoded into a
//! [`ResponseTuple`]. Some responses (pure identifiers) carry no state
//! bytes; in that case both state fields are absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status bytes carried in the first two payload bytes of most responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    /// Outcome of the command as reported by the inverter
    pub transmission: u8,
    /// Current operating mode of the inverter
    pub global: u8,
}

/// Decoded value of a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ResponseData {
    /// ASCII identifier or version fragment
    Text(String),
    /// Measurement
    Float(f32),
    /// Counter
    Integer(u32),
    /// Week and two-digit year
    WeekYear {
        /// Week of the year
        week: u8,
        /// Two-digit year
        year: u8,
    },
    /// Unix timestamp in seconds
    Timestamp(i64),
    /// Alarm codes, oldest first
    Alarms([u8; 4]),
}

impl ResponseData {
    /// Text value, if this is one
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Measurement value, if this is one
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ResponseData::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Counter value, if this is one
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            ResponseData::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Unix seconds, if this is a timestamp
    pub fn as_timestamp(&self) -> Option<i64> {
        match self {
            ResponseData::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Timestamp as a UTC date-time
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        self.as_timestamp()
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
    }

    /// Alarm codes, if this is an alarm set
    pub fn as_alarms(&self) -> Option<[u8; 4]> {
        match self {
            ResponseData::Alarms(a) => Some(*a),
            _ => None,
        }
    }
}

/// Immutable result of a single inverter request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseTuple {
    state: Option<DeviceState>,
    data: Option<ResponseData>,
}

impl ResponseTuple {
    /// Response with both status bytes and a decoded value
    pub(crate) fn with_state(transmission: u8, global: u8, data: ResponseData) -> Self {
        Self {
            state: Some(DeviceState {
                transmission,
                global,
            }),
            data: Some(data),
        }
    }

    /// Response that carries no status bytes
    pub(crate) fn data_only(data: ResponseData) -> Self {
        Self {
            state: None,
            data: Some(data),
        }
    }

    /// Response that could not be decoded
    pub(crate) fn empty() -> Self {
        Self {
            state: None,
            data: None,
        }
    }

    /// Transmission state byte, absent for identifier responses
    pub fn transmission_state(&self) -> Option<u8> {
        self.state.map(|s| s.transmission)
    }

    /// Global state byte, absent for identifier responses
    pub fn global_state(&self) -> Option<u8> {
        self.state.map(|s| s.global)
    }

    /// Both status bytes
    pub fn state(&self) -> Option<DeviceState> {
        self.state
    }

    /// Decoded value
    pub fn data(&self) -> Option<&ResponseData> {
        self.data.as_ref()
    }

    /// Take the decoded value
    pub fn into_data(self) -> Option<ResponseData> {
        self.data
    }

    /// True when nothing could be decoded
    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.data.is_none()
    }
}

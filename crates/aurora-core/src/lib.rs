//! # Aurora Core Library
//!
//! Core functionality for talking to Power-One Aurora PV inverters.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Command frame construction and CRC16 checking
//! - A blocking serial transport with retrying request execution
//! - Decoding of every response shape the inverter uses
//! - Identity, energy, alarm and DSP queries on top of single readings
//!
//! ## Example
//!
//! ```rust,ignore
//! use aurora_core::protocol::{Connection, ConnectionConfig, Reading};
//!
//! let mut conn = Connection::open_serial(ConnectionConfig::default())?;
//! let grid = conn.execute("gridV", 0, 2, 3)?;
//! println!("Grid voltage: {:?}", grid.data());
//!
//! let energy = conn.read(Reading::DayEnergy)?;
//! println!("Energy today: {:?} Wh", energy.data());
//! ```

pub mod energy;
pub mod inverter;
pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::energy::{energy_delta, EnergyTracker};
    pub use crate::inverter::{EnergyPeriod, Inverter, InverterInfo};
    pub use crate::protocol::{
        Connection, ConnectionConfig, ProtocolError, Reading, ResponseData, ResponseTuple,
        SerialTransport, Transport,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

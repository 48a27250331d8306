//! High-level inverter queries
//!
//! Groups the single-reading requests of [`Connection`] into the queries a
//! data logger needs: identity, cumulated energy, alarms, device clock and
//! the DSP measurement set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::protocol::{
    Connection, ConnectionConfig, ProtocolError, Reading, ResponseData, SerialTransport, Transport,
    GLOBAL_SCOPE,
};

/// Identity fields read once when the inverter is first contacted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InverterInfo {
    /// Part number
    pub part_number: Option<String>,
    /// Model and grid standard fragment
    pub version: Option<String>,
    /// Serial number
    pub serial_number: Option<String>,
    /// (week, two-digit year)
    pub manufacture_date: Option<(u8, u8)>,
    /// Firmware release fragment
    pub firmware_release: Option<String>,
}

/// Period of a cumulated energy counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyPeriod {
    /// Since midnight
    Day,
    /// Current week
    Week,
    /// Current month
    Month,
    /// Current year
    Year,
    /// Lifetime
    Total,
    /// Since the partial counter was last reset
    Partial,
}

impl EnergyPeriod {
    /// Every period, in reporting order
    pub const ALL: [EnergyPeriod; 6] = [
        EnergyPeriod::Day,
        EnergyPeriod::Week,
        EnergyPeriod::Month,
        EnergyPeriod::Year,
        EnergyPeriod::Total,
        EnergyPeriod::Partial,
    ];

    /// Counter reading for this period
    pub fn reading(self) -> Reading {
        match self {
            EnergyPeriod::Day => Reading::DayEnergy,
            EnergyPeriod::Week => Reading::WeekEnergy,
            EnergyPeriod::Month => Reading::MonthEnergy,
            EnergyPeriod::Year => Reading::YearEnergy,
            EnergyPeriod::Total => Reading::TotalEnergy,
            EnergyPeriod::Partial => Reading::PartialEnergy,
        }
    }
}

/// An Aurora inverter reached over a [`Connection`]
pub struct Inverter<T: Transport = SerialTransport> {
    conn: Connection<T>,
}

impl Inverter<SerialTransport> {
    /// Open the serial port named in `config`
    pub fn open_serial(config: ConnectionConfig) -> Result<Self, ProtocolError> {
        Ok(Self::new(Connection::open_serial(config)?))
    }
}

impl<T: Transport> Inverter<T> {
    /// Wrap an open connection
    pub fn new(conn: Connection<T>) -> Self {
        Self { conn }
    }

    /// Underlying connection
    pub fn connection(&self) -> &Connection<T> {
        &self.conn
    }

    /// Underlying connection, for single readings
    pub fn connection_mut(&mut self) -> &mut Connection<T> {
        &mut self.conn
    }

    fn data(&mut self, reading: Reading) -> Result<Option<ResponseData>, ProtocolError> {
        Ok(self.conn.read(reading)?.into_data())
    }

    fn text(&mut self, reading: Reading) -> Result<Option<String>, ProtocolError> {
        Ok(match self.data(reading)? {
            Some(ResponseData::Text(s)) => Some(s),
            _ => None,
        })
    }

    /// Read part number, version, serial number, manufacture date and
    /// firmware release
    pub fn identify(&mut self) -> Result<InverterInfo, ProtocolError> {
        let info = InverterInfo {
            part_number: self.text(Reading::PartNumber)?,
            version: self.text(Reading::Version)?,
            serial_number: self.text(Reading::SerialNumber)?,
            manufacture_date: match self.data(Reading::ManufactureDate)? {
                Some(ResponseData::WeekYear { week, year }) => Some((week, year)),
                _ => None,
            },
            firmware_release: self.text(Reading::FirmwareRelease)?,
        };
        tracing::debug!("Inverter identity: {:?}", info);
        Ok(info)
    }

    /// Read one cumulated energy counter, or all of them when `period` is
    /// `None`
    pub fn cumulated_energy(
        &mut self,
        period: Option<EnergyPeriod>,
    ) -> Result<BTreeMap<EnergyPeriod, Option<u32>>, ProtocolError> {
        let periods = match period {
            Some(p) => vec![p],
            None => EnergyPeriod::ALL.to_vec(),
        };

        let mut energy = BTreeMap::new();
        for p in periods {
            let value = self.data(p.reading())?.as_ref().and_then(ResponseData::as_u32);
            energy.insert(p, value);
        }
        Ok(energy)
    }

    /// The last four alarm codes, oldest first
    pub fn last_alarms(&mut self) -> Result<Option<[u8; 4]>, ProtocolError> {
        Ok(self
            .data(Reading::LastAlarms)?
            .as_ref()
            .and_then(ResponseData::as_alarms))
    }

    /// The inverter's clock
    pub fn device_time(&mut self) -> Result<Option<DateTime<Utc>>, ProtocolError> {
        Ok(self
            .data(Reading::TimeDate)?
            .as_ref()
            .and_then(ResponseData::as_datetime))
    }

    /// Every DSP measurement, queried with global scope
    pub fn dsp_readings(&mut self) -> Result<BTreeMap<Reading, Option<f32>>, ProtocolError> {
        let mut dsp = BTreeMap::new();
        for reading in Reading::ALL.iter().copied().filter(|r| r.is_dsp()) {
            let value = self
                .conn
                .request(reading, GLOBAL_SCOPE)?
                .data()
                .and_then(ResponseData::as_f32);
            dsp.insert(reading, value);
        }
        Ok(dsp)
    }

    /// Read each reading of `manifest` once, in order
    pub fn read_manifest(
        &mut self,
        manifest: &[Reading],
    ) -> Result<BTreeMap<Reading, Option<ResponseData>>, ProtocolError> {
        let mut packet = BTreeMap::new();
        for &reading in manifest {
            packet.insert(reading, self.data(reading)?);
        }
        Ok(packet)
    }

    /// Close the connection
    pub fn close(&mut self) {
        self.conn.close();
    }
}

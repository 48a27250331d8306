//! Aurora Inverter Read Test
//!
//! Queries an inverter on a real serial port and prints every reading.
//!
//! Usage:
//!   cargo run --example read_inverter -- [OPTIONS]
//!
//! Options:
//!   --port PORT       Serial port (default: /dev/ttyUSB0)
//!   --address ADDR    Inverter address (default: 2)
//!   --config FILE     JSON connection config (overrides defaults)

use aurora_core::inverter::Inverter;
use aurora_core::protocol::{ConnectionConfig, Reading};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut config = ConnectionConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                if let Some(path) = args.get(i) {
                    config = ConnectionConfig::from_file(path)?;
                }
            }
            "--port" | "-p" => {
                i += 1;
                if let Some(port) = args.get(i) {
                    config.port_name = port.clone();
                }
            }
            "--address" | "-a" => {
                i += 1;
                if let Some(addr) = args.get(i) {
                    config.address = addr.parse()?;
                }
            }
            other => eprintln!("Ignoring unknown argument: {other}"),
        }
        i += 1;
    }

    println!("Opening {} (address {})", config.port_name, config.address);
    let mut inverter = Inverter::open_serial(config)?;

    println!("{:#?}", inverter.identify()?);

    for &reading in Reading::ALL {
        match inverter.connection_mut().read(reading) {
            Ok(r) => println!(
                "{:<16} tx={:?} global={:?} data={:?}",
                reading,
                r.transmission_state(),
                r.global_state(),
                r.data()
            ),
            Err(e) => println!("{:<16} error: {}", reading, e),
        }
    }

    inverter.close();
    Ok(())
}

//! `serialctl`: inspect and exercise serial ports from the command line.
//!
//! # Usage
//!
//! ```bash
//! serialctl list
//! serialctl show ttyUSB0
//! serialctl loopback ttyUSB0 ttyUSB1 --bytes 64
//! ```

use clap::{Parser, Subcommand};
use portable_serial::config::{Config, ConfigLoader};
use portable_serial::port::OpenMode;
use portable_serial::{
    list_ports, logging, transmission_time_millis, BaudRate, CharacterSize, ControlLine,
    FlowControl, Parity, PortConfiguration, PortProperty, SerialPort, StopBit,
};
use std::error::Error;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(version, about = "Inspect and exercise serial ports.")]
struct Args {
    /// Configuration file (otherwise the standard locations are searched)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "portable_serial=trace"
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the serial ports present on this machine
    List,
    /// Open a port and print its settings, queues and control lines
    Show {
        /// Port name; defaults to the configured port
        name: Option<String>,
    },
    /// Send a pattern across a null-modem pair for every supported line setting
    Loopback {
        first: String,
        second: String,
        /// Pattern length per setting
        #[arg(long, default_value_t = 32)]
        bytes: usize,
        /// Only test this baud rate
        #[arg(long)]
        baud: Option<u32>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?.into_config(),
        None => ConfigLoader::load()?.into_config(),
    };
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    logging::init(&config.logging)?;

    match args.command {
        Command::List => list(),
        Command::Show { name } => show(&config, name),
        Command::Loopback {
            first,
            second,
            bytes,
            baud,
        } => loopback(&config, &first, &second, bytes, baud),
    }
}

fn list() -> Result<(), Box<dyn Error>> {
    let ports = list_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        println!("{port}");
    }
    Ok(())
}

fn open(name: &str, config: &Config, line: PortConfiguration) -> Result<SerialPort, Box<dyn Error>> {
    let mut port = SerialPort::with_configuration(name, line);
    port.open(OpenMode::READ_WRITE)?;
    if !config.port.exclusive && !port.set_exclusive(false) {
        warn!(port = name, "could not release exclusive access");
    }
    Ok(port)
}

fn show(config: &Config, name: Option<String>) -> Result<(), Box<dyn Error>> {
    let name = name.unwrap_or_else(|| config.port.name.clone());
    let port = open(&name, config, config.port.to_configuration())?;

    println!("Port:            {} ({})", port.name(), port.path());
    println!("Baud rate:       {}", port.baud_rate());
    println!("Character size:  {}", port.character_size());
    println!("Parity:          {}", port.parity());
    println!("Stop bits:       {}", port.stop_bit());
    println!("Flow control:    {}", port.flow_control());
    println!("Input queue:     {}", port.input_queue_count());
    println!("Output queue:    {}", port.output_queue_count());
    for (label, line) in ControlLine::ALL.iter_names() {
        let state = if port.control_line(line) { "on" } else { "off" };
        println!("{label:<17}{state}");
    }
    Ok(())
}

fn supported<P: PortProperty>() -> impl Iterator<Item = P> {
    P::ALL.iter().copied().filter(|value| value.is_supported())
}

fn loopback(
    config: &Config,
    first: &str,
    second: &str,
    bytes: usize,
    only_baud: Option<u32>,
) -> Result<(), Box<dyn Error>> {
    let baud_rates: Vec<BaudRate> = match only_baud {
        Some(rate) => vec![BaudRate::try_from(rate)?.validate()?],
        None => supported::<BaudRate>().collect(),
    };
    let pattern: Vec<u8> = (0..bytes).map(|i| (i * 37 + 11) as u8).collect();
    let mut sender = open(first, config, PortConfiguration::default())?;
    let mut receiver = open(second, config, PortConfiguration::default())?;

    let mut failures = 0usize;
    let mut total = 0usize;
    for &baud_rate in &baud_rates {
        for character_size in supported::<CharacterSize>() {
            for parity in supported::<Parity>() {
                for stop_bit in supported::<StopBit>() {
                    let line = PortConfiguration {
                        baud_rate,
                        character_size,
                        parity,
                        stop_bit,
                        flow_control: FlowControl::None,
                    };
                    sender.set_configuration(line)?;
                    receiver.set_configuration(line)?;
                    receiver.flush_input();

                    let written = sender.write(&pattern);
                    sender.drain();
                    let per_char = transmission_time_millis(baud_rate, character_size, parity, stop_bit)?;
                    let wait = Duration::from_secs_f64(per_char * written as f64 / 1000.0);
                    thread::sleep(wait + config.testing.settle_margin());

                    let expected: Vec<u8> = pattern.iter().map(|b| b & character_size.mask()).collect();
                    let received = receiver.read_available();
                    total += 1;
                    if written == pattern.len() && received == expected {
                        debug!(%baud_rate, %character_size, %parity, %stop_bit, "loopback ok");
                    } else {
                        failures += 1;
                        println!(
                            "MISMATCH {baud_rate} {}{}{}: wrote {written}, received {}",
                            character_size.bits(),
                            parity.display_name(),
                            stop_bit.display_name(),
                            received.len()
                        );
                    }
                }
            }
        }
    }

    info!(total, failures, "loopback finished");
    println!("{} of {total} settings passed", total - failures);
    if failures > 0 {
        return Err(format!("{failures} settings failed").into());
    }
    Ok(())
}

// src/bin/scd30_config.rs

//! SCD30 configuration CLI
//!
//! Runs on a Linux host (e.g. a Raspberry Pi) with the sensor on an I2C bus.
//!
//! ## Usage
//!
//! ```bash
//! # Show the temperature offset
//! scd30-config temperature-offset
//!
//! # Set the temperature offset to 1.5 °C
//! scd30-config temperature-offset 1.5
//!
//! # Recalibrate against fresh outdoor air (~420 ppm)
//! scd30-config frc 420
//! ```
//!
//! ## Flags
//!
//! - `--log-level <fatal|error|warn|info|debug>` - Log detail (default: warn)
//! - `--sensironscd30-i2c-bus <n>` - Number of the I2C bus (default: 1)
//! - `--sensironscd30-i2c-addr <addr>` - 7-bit address, decimal or 0x hex (default: 0x61)
//!
//! `--scd30-i2c-bus` and `--scd30-i2c-addr` are accepted as short aliases.

use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use env_logger::WriteStyle;
use log::{error, warn, LevelFilter};

use scd30_config::common::{
    ArgumentError, BusConfig, Concentration, Error, GasConcentration, HandlerError, I2cAddr,
    LinuxI2cPortFactory, RelativeHumidity, Temperature, PART_PER_MILLION, DEGREE_CELSIUS,
};
use scd30_config::consumer::{GasHandler, HumidityHandler, TemperatureHandler};
use scd30_config::workflow::{
    run_forced_recalibration, run_temperature_offset, CalibrationOutcome, OffsetReport,
    FORCED_RECALIBRATION_DELAY, FORCED_RECALIBRATION_TOTAL,
};
use scd30_config::{Context, Scd30, SensorOptions};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let is_terminal = std::io::stdout().is_terminal();

    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            init_logger(LevelFilter::Warn, is_terminal);
            return fail(&Error::from(e), is_terminal, true);
        }
    };
    init_logger(cli.log_level, is_terminal);

    if cli.command == Subcommand::Help {
        print_usage();
        return ExitCode::SUCCESS;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to terminate cleanly: cannot start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(execute(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let usage = matches!(e, Error::Argument(_));
            fail(&e, is_terminal, usage)
        }
    }
}

/// Interactive sessions get the error and usage on stderr; every session
/// gets the log line.
fn fail(e: &Error, is_terminal: bool, usage: bool) -> ExitCode {
    if is_terminal {
        eprintln!("Error: {}", e);
        if usage {
            print_usage();
        }
    }
    error!("failed to terminate cleanly: {}", e);
    ExitCode::FAILURE
}

fn init_logger(level: LevelFilter, is_terminal: bool) {
    let style = if is_terminal { WriteStyle::Auto } else { WriteStyle::Never };
    // Only fails if a logger is already installed.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .write_style(style)
        .try_init();
}

fn print_usage() {
    eprintln!("Configure a Sensirion SCD30 gas sensor");
    eprintln!();
    eprintln!("Usage: scd30-config [flags] <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  temperature-offset [offset °C]  Get and set temperature offset");
    eprintln!("  frc <CO2 ppm>                   Set a new baseline CO2 concentration (forced recalibration)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --log-level <level>               fatal, error, warn, info, debug (default: warn)");
    eprintln!("  --sensironscd30-i2c-bus <n>       Number of the I2C bus with the sensor (default: 1)");
    eprintln!("  --sensironscd30-i2c-addr <addr>   7-bit I2C address of the sensor (default: 0x61)");
    eprintln!("  -h, --help                        Show this help");
}

// --- Command Execution ---

async fn execute(cli: Cli) -> Result<(), Error> {
    let factory = LinuxI2cPortFactory::new(cli.bus);
    let ctx = Context::background();

    match cli.command {
        Subcommand::TemperatureOffset(new_offset) => {
            let sensor = Arc::new(Scd30::new(factory, SensorOptions::new())?);
            run_temperature_offset(&ctx, sensor, new_offset, |report| match report {
                OffsetReport::Current(t) => println!("Current temperature offset: {}", t),
                OffsetReport::Updated(t) => println!("New temperature offset:     {}", t),
            })
            .await
        }
        Subcommand::ForcedRecalibration(target) => {
            let options =
                SensorOptions::new().with_forced_recalibration(target, FORCED_RECALIBRATION_DELAY);
            let sensor = Arc::new(Scd30::new(factory, options)?);
            println!(
                "Running forced recalibration for a total duration of {}",
                format_duration(FORCED_RECALIBRATION_TOTAL)
            );
            let outcome =
                run_forced_recalibration(&ctx, sensor, Arc::new(StdoutHandler), FORCED_RECALIBRATION_TOTAL)
                    .await?;
            match outcome {
                CalibrationOutcome::Applied => println!("Completed forced recalibration"),
                CalibrationOutcome::Skipped => {
                    warn!("forced recalibration was not applied before the session ended")
                }
            }
            Ok(())
        }
        Subcommand::Help => Ok(()),
    }
}

/// Minutes and seconds, e.g. `3m0s`.
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}m{}s", secs / 60, secs % 60)
}

/// Prints every measurement as it arrives.
struct StdoutHandler;

#[async_trait]
impl GasHandler for StdoutHandler {
    async fn handle_gas_concentration(
        &self,
        _ctx: &Context,
        value: GasConcentration,
    ) -> Result<(), HandlerError> {
        println!("Gas concentration: {} {}", value.gas, value.amount);
        Ok(())
    }
}

#[async_trait]
impl TemperatureHandler for StdoutHandler {
    async fn handle_temperature(&self, _ctx: &Context, value: Temperature) -> Result<(), HandlerError> {
        println!("Temperature: {}", value);
        Ok(())
    }
}

#[async_trait]
impl HumidityHandler for StdoutHandler {
    async fn handle_relative_humidity(
        &self,
        _ctx: &Context,
        value: RelativeHumidity,
    ) -> Result<(), HandlerError> {
        println!("Relative humidity: {}", value);
        Ok(())
    }
}

// --- Argument Parsing ---

#[derive(Debug, Clone, PartialEq)]
enum Subcommand {
    TemperatureOffset(Option<Temperature>),
    ForcedRecalibration(Concentration),
    Help,
}

#[derive(Debug, Clone, PartialEq)]
struct Cli {
    log_level: LevelFilter,
    bus: BusConfig,
    command: Subcommand,
}

fn parse_args(args: &[String]) -> Result<Cli, ArgumentError> {
    let mut log_level = LevelFilter::Warn;
    let mut bus = BusConfig::default();
    let mut positional: Vec<&str> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "-h" || arg == "--help" {
            return Ok(Cli { log_level, bus, command: Subcommand::Help });
        }
        // Negative numbers are positional arguments, not flags.
        let Some(flag) = arg.strip_prefix("--") else {
            positional.push(arg);
            continue;
        };
        let (name, inline_value) = match flag.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (flag, None),
        };
        let value = match inline_value {
            Some(value) => value,
            None => iter
                .next()
                .map(String::as_str)
                .ok_or_else(|| ArgumentError::MissingFlagValue(arg.clone()))?,
        };
        match name {
            "log-level" => log_level = parse_log_level(value)?,
            "sensironscd30-i2c-bus" | "scd30-i2c-bus" => {
                bus.bus = value.parse().map_err(|_| ArgumentError::InvalidNumber {
                    name: "I2C bus",
                    value: value.to_string(),
                })?
            }
            "sensironscd30-i2c-addr" | "scd30-i2c-addr" => bus.address = I2cAddr::parse(value)?,
            _ => return Err(ArgumentError::UnknownFlag(arg.clone())),
        }
    }

    let (command, rest) = positional.split_first().ok_or(ArgumentError::MissingCommand)?;
    let command = match *command {
        "temperature-offset" => {
            if rest.len() > 1 {
                return Err(ArgumentError::ArgumentCount { expected: "0 or 1", got: rest.len() });
            }
            let offset = match rest.first() {
                Some(text) => Some(parse_number(text, "temperature offset")? * DEGREE_CELSIUS),
                None => None,
            };
            Subcommand::TemperatureOffset(offset)
        }
        "frc" => {
            if rest.len() != 1 {
                return Err(ArgumentError::ArgumentCount { expected: "1", got: rest.len() });
            }
            Subcommand::ForcedRecalibration(parse_number(rest[0], "CO2 ppm")? * PART_PER_MILLION)
        }
        other => return Err(ArgumentError::UnknownCommand(other.to_string())),
    };

    Ok(Cli { log_level, bus, command })
}

fn parse_number(text: &str, name: &'static str) -> Result<f64, ArgumentError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ArgumentError::InvalidNumber { name, value: text.to_string() })
}

/// `fatal` maps to `error`; the log facade has no separate fatal level.
fn parse_log_level(text: &str) -> Result<LevelFilter, ArgumentError> {
    match text.to_ascii_lowercase().as_str() {
        "fatal" | "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        _ => Err(ArgumentError::UnknownLogLevel(text.to_string())),
    }
}

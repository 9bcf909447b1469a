use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use coil_bridge::clock::{Clock, ManualClock, SystemClock};
use coil_bridge::firmata::{self, FirmataBoard, PinMap};
use coil_bridge::logging::{init_logging, LogFormat, LogLevel};
use coil_bridge::record::{self, SweepRecord};
use coil_bridge::{
    convert, ActuatorSink, CalibrationSet, CancelToken, CommandTriple, FieldVector, LogSink,
    RangePolicy, RangeWarning, Sequencer, SweepConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "/dev/ttyACM0", global = true)]
    port: String,

    #[arg(long, default_value_t = firmata::DEFAULT_BAUD, global = true)]
    baud: u32,

    /// Wait after opening the port while the board resets
    #[arg(long, default_value_t = 1000, global = true)]
    settle_ms: u64,

    #[arg(long, default_value_t = 5, global = true)]
    pin_x: u8,

    #[arg(long, default_value_t = 3, global = true)]
    pin_y: u8,

    #[arg(long, default_value_t = 6, global = true)]
    pin_z: u8,

    #[arg(long, value_enum, default_value_t = RangePolicy::Transmit, global = true)]
    range_policy: RangePolicy,

    /// Log commands instead of writing to the board
    #[arg(long, global = true)]
    dry_run: bool,

    /// Print results as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    log_level: LogLevel,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Compute the coil commands for a field without touching the board
    Check(FieldArgs),
    /// Compute the coil commands and write them to the board
    Run(FieldArgs),
    /// Step the field direction from 0 to 90 degrees
    Sweep(SweepArgs),
}

#[derive(clap::Args, Debug)]
struct FieldArgs {
    /// Field magnitude (gauss)
    #[arg(long, allow_negative_numbers = true)]
    magnitude: f64,

    /// Field direction (degrees from the X coil)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    angle: f64,

    /// Z-direction offset (gauss)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    z_offset: f64,
}

#[derive(clap::Args, Debug)]
struct SweepArgs {
    /// Field magnitude (gauss)
    #[arg(long, allow_negative_numbers = true)]
    magnitude: f64,

    /// Change in angle per iteration (degrees)
    #[arg(long, allow_negative_numbers = true)]
    angle_step: f64,

    /// Time between iterations (seconds)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    wait: f64,

    /// Z-direction offset (gauss)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    z_offset: f64,

    /// CSV file the run summary is appended to
    #[arg(long, default_value = record::DEFAULT_RECORD_FILE)]
    record: PathBuf,

    #[arg(long)]
    no_record: bool,

    /// Skip the waits between steps
    #[arg(long)]
    no_wait: bool,
}

#[derive(Serialize)]
struct CheckReport {
    field: FieldVector,
    command: CommandTriple,
    warnings: Vec<RangeWarning>,
}

fn validate_configuration(args: &Args) -> Result<(), &'static str> {
    pin_map(args).validate()?;
    let magnitude = match &args.command {
        Command::Check(f) | Command::Run(f) => f.magnitude,
        Command::Sweep(s) => s.magnitude,
    };
    if magnitude < 0.0 {
        return Err("Field magnitude must not be negative");
    }
    Ok(())
}

fn pin_map(args: &Args) -> PinMap {
    PinMap {
        x: args.pin_x,
        y: args.pin_y,
        z: args.pin_z,
    }
}

fn setup_sink(args: &Args) -> Result<Box<dyn ActuatorSink>> {
    if args.dry_run {
        info!("dry run, board not opened");
        return Ok(Box::new(LogSink::new()));
    }

    let port = firmata::open_serial(&args.port, args.baud, Duration::from_millis(args.settle_ms))
        .with_context(|| format!("Failed to open serial port {}", args.port))?;
    let board = FirmataBoard::attach(port, pin_map(args))?;
    info!(pins = ?board.pins(), "board ready");
    Ok(Box::new(board))
}

fn check(field_args: &FieldArgs, json: bool) -> Result<CheckReport> {
    let field = FieldVector::from_degrees(field_args.magnitude, field_args.angle, field_args.z_offset);
    let command = convert(&field, &CalibrationSet::LAB)?;
    let warnings = command.range_warnings();

    if json {
        record::write_json(io::stdout().lock(), &CheckReport { field, command, warnings: warnings.clone() })?;
    } else {
        println!("Inputs for board:");
        println!("x = {:.4}", command.x);
        println!("y = {:.4}", command.y);
        println!("z = {:.4}", command.z);
        for warning in &warnings {
            println!("{}", warning);
        }
    }

    Ok(CheckReport {
        field,
        command,
        warnings,
    })
}

fn run(args: &Args, field_args: &FieldArgs) -> Result<()> {
    let report = check(field_args, args.json)?;
    // refuse before the port is opened
    let command = args.range_policy.apply(&report.command)?;

    let mut sink = setup_sink(args)?;
    sink.apply(&command)?;
    info!(%command, "commands written");
    Ok(())
}

fn sweep(args: &Args, sweep_args: &SweepArgs) -> Result<()> {
    let config = SweepConfig {
        magnitude: sweep_args.magnitude,
        angle_step_degrees: sweep_args.angle_step,
        wait_seconds: sweep_args.wait,
        z_offset: sweep_args.z_offset,
    };
    config.validate()?;

    let mut sink = setup_sink(args)?;
    let mut clock: Box<dyn Clock> = if sweep_args.no_wait {
        Box::new(ManualClock::new())
    } else {
        Box::new(SystemClock::new())
    };

    let mut sequencer = Sequencer::new(CalibrationSet::LAB, args.range_policy);
    let result = sequencer.run(&config, sink.as_mut(), clock.as_mut(), &CancelToken::new())?;
    if result.cancelled {
        warn!("sweep stopped early");
    }

    let summary = SweepRecord::from(&result);
    if !sweep_args.no_record {
        record::append_record(&sweep_args.record, &summary)
            .with_context(|| format!("Failed to write {}", sweep_args.record.display()))?;
    }

    if args.json {
        record::write_json(io::stdout().lock(), &result)?;
    } else {
        println!(
            "done. {} steps, {:.3} s elapsed ({:.3} s expected), average magnitude {:.4} G",
            summary.iteration_count,
            summary.actual_runtime,
            summary.expected_runtime,
            summary.average_measured_magnitude
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level, args.log_format);

    if let Err(e) = validate_configuration(&args) {
        bail!("{}", e);
    }

    match &args.command {
        Command::Check(field_args) => check(field_args, args.json).map(|_| ()),
        Command::Run(field_args) => run(&args, field_args),
        Command::Sweep(sweep_args) => sweep(&args, sweep_args),
    }
}

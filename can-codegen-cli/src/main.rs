//! CAN Codec Generator CLI Application
//!
//! Command-line front end of the can-codegen library:
//! - `layout`: print the bit-chunk plan of every message
//! - `pack`: physical signal values to a frame payload
//! - `unpack`: frame payload to physical values with range status
//! - `check`: build every codec and report schema errors

use anyhow::{bail, Context, Result};
use can_codegen::{CodegenConfig, Generator, MessageCodec, MessageDefinition};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::PathBuf;

mod config;
mod input;
mod report;

use config::{AppConfig, OutputFormat};
use report::{CheckFailure, CheckSummary, DecodedFrame, MessageLayout};

/// CAN Codec Generator - plan, pack and unpack CAN signals from DBC files
#[derive(Parser, Debug)]
#[command(name = "can-codegen-cli")]
#[command(about = "Generate and exercise CAN signal codecs from DBC files", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the chunk plan of each message
    Layout {
        /// Path to DBC file(s) (can be repeated)
        #[arg(long, value_name = "FILE")]
        dbc: Vec<PathBuf>,

        /// Only show this message
        #[arg(short, long, value_name = "NAME")]
        message: Option<String>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Encode physical values and pack them into a frame
    Pack {
        #[arg(long, value_name = "FILE")]
        dbc: Vec<PathBuf>,

        #[arg(short, long, value_name = "NAME")]
        message: String,

        /// Signal values as SIGNAL=VALUE
        #[arg(value_name = "SIGNAL=VALUE")]
        signals: Vec<String>,
    },

    /// Unpack a frame payload and decode every signal
    Unpack {
        #[arg(long, value_name = "FILE")]
        dbc: Vec<PathBuf>,

        #[arg(short, long, value_name = "NAME")]
        message: String,

        /// Payload bytes in hex, e.g. FAFF1F0000000000
        #[arg(value_name = "HEX")]
        payload: String,

        #[arg(long)]
        json: bool,
    },

    /// Build every codec and report messages with invalid layouts
    Check {
        #[arg(long, value_name = "FILE")]
        dbc: Vec<PathBuf>,

        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("CAN Codec Generator CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using codegen library v{}", can_codegen::VERSION);

    let app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    let codegen_config = app_config.generation.to_codegen_config();
    let default_format = app_config.output.format;

    match args.command {
        Command::Layout { dbc, message, json } => {
            let generator = load_generator(&dbc, &app_config)?;
            let format = output_format(json, default_format);
            run_layout(&generator, &codegen_config, message.as_deref(), format)
        }
        Command::Pack {
            dbc,
            message,
            signals,
        } => {
            let generator = load_generator(&dbc, &app_config)?;
            run_pack(&generator, &message, &signals)
        }
        Command::Unpack {
            dbc,
            message,
            payload,
            json,
        } => {
            let generator = load_generator(&dbc, &app_config)?;
            run_unpack(&generator, &message, &payload, output_format(json, default_format))
        }
        Command::Check { dbc, json } => {
            let generator = load_generator(&dbc, &app_config)?;
            run_check(&generator, &codegen_config, output_format(json, default_format))
        }
    }
}

fn output_format(json_flag: bool, default: OutputFormat) -> OutputFormat {
    if json_flag {
        OutputFormat::Json
    } else {
        default
    }
}

/// Load DBC files from the command line, falling back to the config file
fn load_generator(cli_dbc: &[PathBuf], app_config: &AppConfig) -> Result<Generator> {
    let files: &[PathBuf] = if cli_dbc.is_empty() {
        &app_config.input.dbc_files
    } else {
        cli_dbc
    };

    if files.is_empty() {
        bail!("No DBC file given (use --dbc FILE or [input] dbc_files in the config)");
    }

    let mut generator = Generator::new();
    for path in files {
        generator
            .add_dbc(path)
            .with_context(|| format!("Failed to load DBC file: {:?}", path))?;
    }

    let stats = generator.database_stats();
    log::info!(
        "Signal database: {} message(s), {} signal(s), {} multiplexed",
        stats.num_messages,
        stats.num_signals,
        stats.num_multiplexed
    );

    Ok(generator)
}

/// Codecs built for the selected messages, plus what was skipped
struct BuildOutcome {
    codecs: Vec<MessageCodec>,
    summary: CheckSummary,
}

/// Build codecs for every selected message in parallel.
///
/// Mirrors `Generator::generate`: an invalid message is recorded in the
/// summary, or aborts the run when `fail_fast` is set.
fn build_codecs(generator: &Generator, config: &CodegenConfig) -> Result<BuildOutcome> {
    let messages = generator.database().messages();

    let built: Vec<(&MessageDefinition, can_codegen::Result<MessageCodec>)> = messages
        .par_iter()
        .filter(|message| config.should_generate(message))
        .map(|message| (message, MessageCodec::new(message)))
        .collect();

    let mut outcome = BuildOutcome {
        codecs: Vec::with_capacity(built.len()),
        summary: CheckSummary {
            filtered: messages.len() - built.len(),
            ..CheckSummary::default()
        },
    };

    for (definition, result) in built {
        match result {
            Ok(codec) => {
                outcome.summary.generated += 1;
                outcome.codecs.push(codec);
            }
            Err(e) if config.fail_fast => {
                return Err(e).with_context(|| {
                    format!("Invalid layout in message {} (0x{:X})", definition.name, definition.id)
                });
            }
            Err(e) => {
                log::warn!("Skipping message {}: {}", definition.name, e);
                outcome.summary.failures.push(CheckFailure {
                    id: definition.id,
                    name: definition.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(outcome)
}

fn run_layout(
    generator: &Generator,
    config: &CodegenConfig,
    message: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let layouts: Vec<MessageLayout> = match message {
        Some(name) => {
            let generated = generator.generate_message(name)?;
            vec![MessageLayout::from_codec(&generated.codec)]
        }
        None => build_codecs(generator, config)?
            .codecs
            .iter()
            .map(MessageLayout::from_codec)
            .collect(),
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&layouts)?),
        OutputFormat::Text => print!("{}", report::render_layouts_text(&layouts)),
    }

    Ok(())
}

fn run_pack(generator: &Generator, message: &str, assignments: &[String]) -> Result<()> {
    let generated = generator.generate_message(message)?;

    let values = assignments
        .iter()
        .map(|text| input::parse_assignment(text))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    for (name, physical) in &values {
        let codec = generated.codec.signal_codec(name)?;
        if !codec.is_in_range(codec.encode(*physical)) {
            log::warn!("{}.{} = {} is outside its declared range", message, name, physical);
        }
    }

    let borrowed: Vec<(&str, f64)> = values
        .iter()
        .map(|(name, physical)| (name.as_str(), *physical))
        .collect();

    let mut frame = vec![0u8; generated.codec.byte_length()];
    generated.codec.pack_physical(&mut frame, &borrowed)?;

    println!("{}", input::format_hex(&frame));
    Ok(())
}

fn run_unpack(
    generator: &Generator,
    message: &str,
    payload: &str,
    format: OutputFormat,
) -> Result<()> {
    let generated = generator.generate_message(message)?;
    let bytes = input::parse_hex(payload)?;

    let signals = generated
        .codec
        .unpack_physical(&bytes)
        .with_context(|| format!("Cannot unpack {} from {} byte(s)", message, bytes.len()))?;
    let frame = DecodedFrame::new(&generated.codec, signals);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&frame)?),
        OutputFormat::Text => print!("{}", report::render_decoded_text(&frame)),
    }

    Ok(())
}

fn run_check(generator: &Generator, config: &CodegenConfig, format: OutputFormat) -> Result<()> {
    let summary = build_codecs(generator, config)?.summary;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print!("{}", report::render_check_text(&summary)),
    }

    if !summary.failures.is_empty() {
        bail!("{} message(s) have invalid layouts", summary.failures.len());
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

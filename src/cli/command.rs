use std::path::PathBuf;
use std::sync::LazyLock;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};

static LONG_VERSION: LazyLock<String> = LazyLock::new(|| {
    format!(
        "{} ({})\ncodecpar {}\nbuilt {}",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_DESCRIBE").unwrap_or("unknown"),
        env!("CODECPAR_VERSION"),
        env!("BUILD_TIMESTAMP"),
    )
});

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION.as_str(),
    about        = "Tools for inspecting and editing codec parameter snapshots",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the parameters stored in a snapshot
    Info(InfoArgs),

    /// Change fields of a snapshot and write it back.
    Edit(EditArgs),
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input snapshot, YAML or JSON (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Input snapshot, YAML or JSON (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Write the edited snapshot here instead of stdout.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Frame width in pixels.
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub width: Option<i64>,

    /// Frame height in pixels.
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub height: Option<i64>,

    /// Average bit rate in bits per second.
    #[arg(long, value_name = "N")]
    pub bit_rate: Option<i64>,

    /// Audio sample rate in Hz.
    #[arg(long, value_name = "N")]
    pub sample_rate: Option<i64>,

    /// Channel layout, e.g. "stereo", "5.1(side)", "FL+FR+LFE" or "0x3f".
    #[arg(long, value_name = "LAYOUT")]
    pub channel_layout: Option<String>,

    /// Replace the extra data with these hex encoded bytes.
    #[arg(long, value_name = "HEX", conflicts_with = "clear_extradata")]
    pub extradata: Option<String>,

    /// Remove the extra data.
    #[arg(long)]
    pub clear_extradata: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

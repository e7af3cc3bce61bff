use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use scalelink_session::{ScaleClient, ScaleConfig};
use scalelink_transport::SerialConfig;

use crate::exit::{scale_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod plu;
pub mod ports;
pub mod probe;
pub mod sales;
pub mod settings;
pub mod status;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial ports visible to the OS.
    Ports,
    /// Handshake with the scale and report readiness.
    Probe,
    /// Read the live weighing status.
    Status(StatusArgs),
    /// Read, upload or delete products.
    #[command(subcommand)]
    Plu(PluCommand),
    /// Read or reset the sales counters.
    #[command(subcommand)]
    Sales(SalesCommand),
    /// Read a raw settings block.
    Settings(SettingsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, link: &LinkArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ports => ports::run(format),
        Command::Probe => probe::run(link, format),
        Command::Status(args) => status::run(args, link, format),
        Command::Plu(command) => plu::run(command, link, format),
        Command::Sales(command) => sales::run(command, link, format),
        Command::Settings(args) => settings::run(args, link, format),
        Command::Version(args) => version::run(args),
    }
}

/// Serial line options shared by every command that talks to the scale.
#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    /// Serial port the scale is attached to.
    #[arg(long, short = 'p', env = "SCALELINK_PORT", global = true)]
    pub port: Option<String>,
    /// Line speed in baud.
    #[arg(
        long,
        env = "SCALELINK_BAUD",
        default_value_t = SerialConfig::DEFAULT_BAUD_RATE,
        global = true
    )]
    pub baud: u32,
    /// How long to wait for the scale to report ready (e.g. 10s, 500ms).
    #[arg(long, default_value = "10s", global = true)]
    pub handshake_timeout: String,
}

impl LinkArgs {
    pub fn config(&self) -> CliResult<ScaleConfig> {
        let mut serial = match &self.port {
            Some(port) => SerialConfig::new(port.clone()),
            None => SerialConfig::default(),
        };
        serial.baud_rate = self.baud;

        let mut config = ScaleConfig::with_serial(serial);
        config.handshake_timeout = parse_duration(&self.handshake_timeout)?;
        Ok(config)
    }

    /// A client that has completed the handshake.
    pub fn connect(&self) -> CliResult<ScaleClient> {
        let mut client = ScaleClient::serial(self.config()?);
        client
            .connect()
            .map_err(|err| scale_error("connect failed", err))?;
        Ok(client)
    }
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Keep polling until interrupted, reconnecting when the scale drops.
    #[arg(long)]
    pub watch: bool,
    /// Delay between readings in watch mode (e.g. 1s, 250ms).
    #[arg(long, default_value = "1s", requires = "watch")]
    pub interval: String,
    /// Exit after N readings in watch mode.
    #[arg(long, requires = "watch")]
    pub count: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum PluCommand {
    /// Read products by number.
    Get {
        /// PLU numbers to read.
        #[arg(required = true, num_args = 1..)]
        ids: Vec<u32>,
    },
    /// Upload products from a JSON file (one object or an array).
    Put {
        #[arg(long, value_name = "PATH")]
        file: PathBuf,
    },
    /// Delete a product.
    Delete {
        /// PLU number to delete.
        id: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum SalesCommand {
    /// Read the total sales counters.
    Get,
    /// Reset the total sales counters.
    Reset,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SettingsTarget {
    User,
    Factory,
}

#[derive(Args, Debug)]
pub struct SettingsArgs {
    /// Which block to read.
    #[arg(value_enum)]
    pub target: SettingsTarget,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `5s`, `500ms` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

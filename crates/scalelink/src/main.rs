mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{Command, LinkArgs};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "scalelink",
    version,
    about = "Talk to a retail weighing scale over a serial line"
)]
struct Cli {
    #[command(flatten)]
    link: LinkArgs,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr). Serial wire dumps appear at trace.
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, &cli.link, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::PluCommand;

    #[test]
    fn parses_plu_get_with_several_ids() {
        let cli = Cli::try_parse_from(["scalelink", "--port", "/dev/ttyUSB0", "plu", "get", "1", "2"])
            .expect("plu get args should parse");

        assert_eq!(cli.link.port.as_deref(), Some("/dev/ttyUSB0"));
        match cli.command {
            Command::Plu(PluCommand::Get { ids }) => assert_eq!(ids, vec![1, 2]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn link_options_are_global() {
        let cli = Cli::try_parse_from(["scalelink", "probe", "-p", "COM3", "--baud", "4800"])
            .expect("probe args should parse");
        assert_eq!(cli.link.port.as_deref(), Some("COM3"));
        assert_eq!(cli.link.baud, 4800);
    }

    #[test]
    fn plu_get_requires_an_id() {
        let err = Cli::try_parse_from(["scalelink", "plu", "get"])
            .expect_err("missing ids should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_status_watch() {
        let cli = Cli::try_parse_from([
            "scalelink",
            "status",
            "--watch",
            "--interval",
            "250ms",
            "--count",
            "3",
        ])
        .expect("status watch args should parse");

        match cli.command {
            Command::Status(args) => {
                assert!(args.watch);
                assert_eq!(args.interval, "250ms");
                assert_eq!(args.count, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn interval_requires_watch() {
        let err = Cli::try_parse_from(["scalelink", "status", "--interval", "2s"])
            .expect_err("interval without watch should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn rejects_unknown_settings_block() {
        let err = Cli::try_parse_from(["scalelink", "settings", "network"])
            .expect_err("unknown block should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}

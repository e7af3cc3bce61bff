use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Module that logs every byte sent to and received from the scale.
const WIRE_TARGET: &str = "scalelink_session::exchange";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }

    /// Per-target filter: hex wire dumps only appear at trace, so `debug`
    /// shows the session lifecycle without one line per byte burst.
    pub fn targets(self) -> Targets {
        let level = self.as_filter();
        let wire = match self {
            LogLevel::Trace => LevelFilter::TRACE,
            _ => level.min(LevelFilter::INFO),
        };
        Targets::new()
            .with_default(level)
            .with_target(WIRE_TARGET, wire)
    }

    /// Name the emitting module at debug and below.
    fn shows_target(self) -> bool {
        matches!(self, LogLevel::Debug | LogLevel::Trace)
    }
}

/// Install the stderr subscriber. Stdout is reserved for command output.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level.as_filter())
        .with_ansi(false)
        .with_target(level.shows_target());

    match format {
        LogFormat::Text => {
            let _ = builder.finish().with(level.targets()).try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().finish().with(level.targets()).try_init();
        }
    }
}

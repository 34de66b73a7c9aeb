//----------------------------------------------------------------------------------------- std lib
use std::io::Write;
use std::time::Instant;
//--------------------------------------------------------------------------------- other libraries
use log::info;
use once_cell::sync::Lazy;
use tracing_subscriber::Layer as _;
use tracing_subscriber::layer::SubscriberExt as _;

// This will get initialized below.
/// Returns the init [`Instant`]
pub static INIT_INSTANT: Lazy<Instant> = Lazy::new(Instant::now);

/// Returns the seconds since [`INIT_INSTANT`].
#[cfg(not(tarpaulin_include))]
pub fn uptime() -> u64 {
    INIT_INSTANT.elapsed().as_secs()
}

const DEFAULT_DIRECTIVES: &str =
    "off,songboard_core={level},songboard_storage={level},songboard_daemon={level}";

//---------------------------------------------------------------------------------------------------- Logger init function
#[allow(clippy::module_name_repetitions)]
/// Initializes the logger.
///
/// This enables console logging on all the internals of `Songboard`.
///
/// Functionality is provided by [`log`].
///
/// The levels are:
/// - ERROR
/// - WARN
/// - INFO
/// - DEBUG
/// - TRACE
///
/// # Panics
/// This must only be called _once_.
#[cfg(not(tarpaulin_include))]
pub fn init_logger(filter: log::LevelFilter) {
    // Initialize timer.
    let now = Lazy::force(&INIT_INSTANT);

    // If `RUST_LOG` isn't set, disable all library crate logs except for
    // songboard and its sub-crates.
    let env = std::env::var("RUST_LOG").unwrap_or_default();

    let mut builder = env_logger::Builder::new();
    builder
        .format(move |buf, record| {
            let style = buf.default_level_style(record.level());
            let level = match record.level() {
                log::Level::Debug => "D",
                log::Level::Trace => "T",
                log::Level::Info => "I",
                log::Level::Warn => "W",
                log::Level::Error => "E",
            };
            writeln!(
                buf,
                // Longest PATH in the repo: `storage/src/db/schemas/settings.rs` - `34` characters
                "| {style}{level}{style:#} | {: >9.3}s | {: >34} @ {: <4} | {}",
                now.elapsed().as_secs_f64(),
                record.file_static().unwrap_or("???"),
                record.line().unwrap_or(0),
                record.args(),
            )
        })
        .write_style(env_logger::WriteStyle::Always);

    if env.is_empty() {
        builder.parse_filters(&DEFAULT_DIRECTIVES.replace("{level}", &filter.to_string()));
    } else {
        builder.parse_filters(&env);
    }
    builder.init();

    if env.is_empty() {
        info!("Log Level (Flag) ... {filter}");
    } else {
        info!("Log Level (RUST_LOG) ... {env}");
    }
}

/// Initializes the tracing layer.
///
/// # Panics
///
/// panics if the tracing filter cannot be parsed.
#[must_use]
pub fn init_tracing() -> impl tracing::Subscriber {
    let filter = tracing_subscriber::EnvFilter::builder()
        .parse(DEFAULT_DIRECTIVES.replace("{level}", "trace"))
        .unwrap();

    tracing_subscriber::registry().with(tracing_subscriber::fmt::layer().with_filter(filter))
}

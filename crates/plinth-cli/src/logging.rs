//! Tracing subscriber setup for the `plinth` binary.
//!
//! The library crates only emit spans and events; this is the one place a
//! subscriber is installed. Logs always go to stderr so stdout stays clean
//! for command output (`plinth plugins --format json | jq`).
//!
//! | Flag(s)   | Level |
//! |-----------|-------|
//! | (none)    | warn  |
//! | `-v`      | info  |
//! | `-vv`     | debug |
//! | `-vvv`    | trace |
//! | `--quiet` | error |
//!
//! A non-empty `RUST_LOG` replaces the derived filter entirely.

use std::io::IsTerminal as _;

use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::LevelFilter,
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::cli::{GlobalArgs, LogFormat};

/// Crates whose events are shown at the derived level.
const WORKSPACE_TARGETS: &[&str] = &["plinth", "plinth_core", "plinth_adapters"];

/// Install the global subscriber. Fails if one is already set.
pub fn init_logging(args: &GlobalArgs) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => EnvFilter::try_new(filter_directives(derive_level(args)))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer(args))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise tracing: {e}"))
}

fn stderr_layer<S>(args: &GlobalArgs) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    match args.log_format {
        LogFormat::Json => layer.json().with_current_span(true).flatten_event(true).boxed(),
        LogFormat::Text => layer
            .with_target(false)
            .with_ansi(!args.no_color && std::io::stderr().is_terminal())
            .boxed(),
    }
}

/// `target=level` for each workspace crate; dependencies stay silent.
fn filter_directives(level: LevelFilter) -> String {
    WORKSPACE_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn derive_level(args: &GlobalArgs) -> LevelFilter {
    if args.quiet {
        return LevelFilter::ERROR;
    }
    match args.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

//! Logger setup for the binaries.
//!
//! The library only emits through the `log` facade. Binaries install
//! `env_logger` once at startup; `RUST_LOG` still overrides the level given
//! on the command line.

use log::LevelFilter;

/// Install `env_logger` with `level` as the default filter.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .target(env_logger::Target::Stderr)
        .try_init()
}

//! Logger initialization on top of `log4rs`. Crates log through the `log` macros re-exported
//! from the crate root (`utxodag_core::{debug, info, ...}`).

use consts::{DEFAULT_LOG_LEVEL, DEFAULT_LOGGER_ENV, LOG_LINE_PATTERN_COLORED};
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
};
use logger::Builder;

pub use logger::LogError;

mod consts;
mod logger;

const CONSOLE_APPENDER: &str = "stdout";

/// Initializes the global logger with a console appender. `filters` follows the `RUST_LOG`
/// syntax; when empty, the `RUST_LOG` environment variable is used and then the default level.
pub fn init_logger(filters: &str) -> Result<(), LogError> {
    let expression = if !filters.is_empty() {
        filters.to_owned()
    } else {
        std::env::var(DEFAULT_LOGGER_ENV).unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_owned())
    };
    let loggers = Builder::from_expression(&expression).build();
    let appenders = [CONSOLE_APPENDER];

    let stdout = ConsoleAppender::builder().encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN_COLORED))).build();
    let config = log4rs::config::Config::builder()
        .appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(stdout)))
        .loggers(loggers.items(&appenders))
        .build(Root::builder().appenders(appenders).build(loggers.root_level()))
        .map_err(|err| LogError::InitError(err.to_string()))?;
    log4rs::init_config(config).map_err(|err| LogError::InitError(err.to_string()))?;
    Ok(())
}

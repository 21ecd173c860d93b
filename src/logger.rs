// Copyright 2023 Simo Sorce
// See LICENSE.txt file for terms

use std::fs::File;

use simplelog::{ConfigBuilder, LevelFilter, SimpleLogger, WriteLogger};

/// Initializes a simple logger for tracing purposes based on the values of
/// the environment variable P11CLIENT_TRACE:
/// - stdout -> logs to standard output
/// - file -> any other value is interpreted as a file name to log into
/// - NOT PRESENT -> No tracing is initialized
///
/// Returns whether a logger was installed. If the logger initialization
/// encounters an error, (for example the log file can't be opened or a
/// logger is already installed) no tracing is available and false is
/// returned.
///
/// Additionally the log level can be selected with the environment variable
/// P11CLIENT_TRACE_LEVEL
/// It defaults to LevelFilter::Error.
/// Valid values are: off, error, warn, info, debug, trace.
/// Any incorrect value triggers the highest logging level: LevelFilter::Trace
pub fn log_init() -> bool {
    let level = match std::env::var("P11CLIENT_TRACE_LEVEL") {
        Err(_) => LevelFilter::Error,
        Ok(l) => match l.as_str() {
            "off" => LevelFilter::Off,
            "error" => LevelFilter::Error,
            "warn" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Trace,
        },
    };
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .build();
    match std::env::var("P11CLIENT_TRACE") {
        Err(_) => false,
        Ok(t) => match t.as_str() {
            "stdout" => SimpleLogger::init(level, config).is_ok(),
            file_name => match File::create(file_name) {
                Ok(file) => WriteLogger::init(level, config, file).is_ok(),
                Err(_) => false,
            },
        },
    }
}

#[test]
pub fn test_init() {
    if std::env::var("P11CLIENT_TRACE").is_err() {
        assert!(!log_init());
    }
}

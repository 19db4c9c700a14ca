//! Logger setup
//!
//! The terminal is owned by the display, so nothing is logged to it. With
//! `DEBUG` set, debug output is appended to `debug.log` in the working
//! directory; otherwise `RUST_LOG` applies and defaults to off.

use std::fs::OpenOptions;

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

const DEBUG_ENV: &str = "DEBUG";
const DEBUG_LOG_FILE: &str = "debug.log";

pub fn setup_logger() {
    let mut builder = Builder::from_env(Env::default().default_filter_or("off"));

    if std::env::var_os(DEBUG_ENV).is_some_and(|value| !value.is_empty()) {
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(DEBUG_LOG_FILE)
        {
            Ok(file) => {
                builder
                    .filter_level(LevelFilter::Debug)
                    .target(Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Could not open {}: {}", DEBUG_LOG_FILE, e),
        }
    }

    if builder.try_init().is_ok() {
        log::debug!("tz {} starting", env!("CARGO_PKG_VERSION"));
    }
}

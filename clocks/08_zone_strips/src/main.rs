//! Zone Strips Clock
//!
//! The time in several zones at once: one header and one 24-hour strip per
//! zone, all aligned on the local day. The keyboard moves the displayed
//! instant by minutes, hours, days, and weeks.

mod browser;
mod cli;
mod drawing;
mod logging;
mod model;
mod strips;
mod terminal;

use std::io::{self, Write};
use std::process::ExitCode;

use chrono::Utc;
use chrono_tz::Tz;
use crossterm::tty::IsTty;
use shared::{search_timezones, Clock, Config, Zone};

use crate::cli::Cli;
use crate::drawing::Theme;
use crate::model::Model;

const EXIT_TERMINAL: u8 = 1;
const EXIT_CONFIG: u8 = 2;
const EXIT_UNKNOWN_ZONE: u8 = 3;

fn main() -> ExitCode {
    logging::setup_logger();
    let cli = Cli::parse_args(std::env::args());
    log::debug!("{:?}", cli);

    if cli.version {
        println!("tz {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }
    if let Some(query) = &cli.list {
        return list_zones(query);
    }

    let config = match Config::load(&cli.zones) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    let reference = config.zones.first().map_or(Tz::UTC, Zone::tz);

    let clock = match cli.when {
        Some(seconds) => match Clock::from_unix_timestamp(seconds, reference) {
            Some(clock) => clock,
            None => {
                eprintln!("Config error: timestamp {} is out of range", seconds);
                return ExitCode::from(EXIT_CONFIG);
            }
        },
        None => Clock::now(reference),
    };

    let mut model = Model::new(config, clock);
    model.is_military = cli.military;
    model.watch = cli.watch;
    model.interactive = !cli.quick && io::stdout().is_tty();

    let theme = Theme::detect();
    let result = if model.interactive {
        terminal::run(model, &theme)
    } else {
        print_once(&model, &theme)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_TERMINAL)
        }
    }
}

fn print_once(model: &Model, theme: &Theme) -> io::Result<()> {
    let screen = drawing::view(model, terminal::terminal_width(), theme);
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", screen)?;
    stdout.flush()
}

fn list_zones(query: &str) -> ExitCode {
    let listings = search_timezones(query, Utc::now());
    if listings.is_empty() {
        eprintln!("Unknown time zone {}", query);
        return ExitCode::from(EXIT_UNKNOWN_ZONE);
    }

    let mut stdout = io::stdout().lock();
    for listing in listings {
        if writeln!(stdout, "{}", listing).is_err() {
            // Reader went away
            break;
        }
    }
    ExitCode::SUCCESS
}

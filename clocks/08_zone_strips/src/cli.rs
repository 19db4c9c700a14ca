//! Command-line arguments
//!
//! The long-standing single-dash spellings `-when` and `-list` are accepted
//! and rewritten to their `--` forms before clap sees them.

use chrono::DateTime;
use clap::Parser;

const WHEN_PARSE_ERROR: &str =
    "Could not parse integer (format: 123) or date-time (format: 2006-01-02T15:04:05+07:00)";

#[derive(Debug, Parser)]
#[command(name = "tz")]
#[command(about = "Show the time in several zones at once, with hour strips", long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Date-time as seconds since the Unix epoch or RFC 3339 (disables -w)
    #[arg(long, value_name = "WHEN", value_parser = parse_when, allow_hyphen_values = true)]
    pub when: Option<i64>,

    /// Render once and exit
    #[arg(short = 'q')]
    pub quick: bool,

    /// Use 24-hour time in headers
    #[arg(short = 'm')]
    pub military: bool,

    /// Follow the wall clock once a minute
    #[arg(short = 'w')]
    pub watch: bool,

    /// List zones whose name or abbreviation contains FILTER, then exit
    #[arg(long, value_name = "FILTER", num_args = 0..=1, default_missing_value = "")]
    pub list: Option<String>,

    /// Print the version and exit
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Zones to show, as `id[,name]`
    #[arg(value_name = "ZONE")]
    pub zones: Vec<String>,
}

impl Cli {
    /// Parse `args` after rewriting single-dash long flags
    pub fn parse_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self::parse_from(normalize_args(args))
    }
}

/// Rewrite `-when`/`-list` (and their `=value` forms) to `--when`/`--list`
pub fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .map(|arg| {
            for flag in ["-when", "-list"] {
                let is_flag = arg == flag
                    || arg
                        .strip_prefix(flag)
                        .is_some_and(|rest| rest.starts_with('='));
                if is_flag {
                    return format!("-{}", arg);
                }
            }
            arg
        })
        .collect()
}

/// Seconds since the epoch, from an integer or an RFC 3339 date-time
pub fn parse_when(value: &str) -> Result<i64, String> {
    if let Ok(seconds) = value.parse::<i64>() {
        return Ok(seconds);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|instant| instant.timestamp())
        .map_err(|_| WHEN_PARSE_ERROR.to_string())
}

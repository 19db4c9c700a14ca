//! Time Engine - timezone identity, conversion, and DST detection
//!
//! Every zone shown on screen is a [`Zone`]: an IANA identifier resolved once,
//! at configuration time, plus a display name. Rendering code only ever asks a
//! zone to convert an instant it already holds, so conversion cannot fail.

use std::fmt;
use std::fs;

use chrono::{
    DateTime, Duration, NaiveDateTime, NaiveTime, Offset, TimeZone, Timelike, Utc,
};
use chrono_tz::{OffsetComponents, Tz};
use thiserror::Error;

use crate::style::{FormatStyle, ZoneStyle};

/// Display name of the first zone in every zone list
pub const LOCAL_ZONE_NAME: &str = "Local";

/// Clock faces for hours 0-11
pub const EMOJI_CLOCKS: [&str; 12] = [
    "🕛", "🕐", "🕑", "🕒", "🕓", "🕔", "🕕", "🕖", "🕗", "🕘", "🕙", "🕚",
];

/// A zone identifier the timezone database does not know
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown time zone {0}")]
pub struct UnknownZone(pub String);

impl UnknownZone {
    /// The identifier that failed to resolve
    pub fn identifier(&self) -> &str {
        &self.0
    }
}

/// A named timezone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Identifier in the timezone database (e.g. "Europe/Paris")
    db_name: String,
    /// Name shown in the zone header
    name: String,
    tz: Tz,
}

impl Zone {
    /// Resolve `db_name` in the timezone database.
    ///
    /// The display name defaults to the identifier.
    pub fn new(db_name: &str, name: Option<&str>) -> Result<Self, UnknownZone> {
        let tz = parse_timezone(db_name)?;
        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => tz.name().to_string(),
        };
        Ok(Self::from_tz(tz, name))
    }

    /// Build a zone from an already-resolved `Tz`
    pub fn from_tz(tz: Tz, name: impl Into<String>) -> Self {
        Self {
            db_name: tz.name().to_string(),
            name: name.into(),
            tz,
        }
    }

    /// The system's zone, displayed as "Local"
    pub fn local() -> Self {
        let tz = system_timezone().unwrap_or_else(|| {
            log::warn!("Could not determine the system time zone, using UTC");
            Tz::UTC
        });
        Self::from_tz(tz, LOCAL_ZONE_NAME)
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Wall-clock reading of `instant` in this zone
    pub fn local_time<T: TimeZone>(&self, instant: &DateTime<T>) -> DateTime<Tz> {
        instant.with_timezone(&self.tz)
    }

    /// Clock face matching the local hour
    pub fn clock_emoji<T: TimeZone>(&self, instant: &DateTime<T>) -> &'static str {
        let hour = self.local_time(instant).hour() % 12;
        EMOJI_CLOCKS[hour as usize]
    }

    /// Abbreviation in effect at `instant` (e.g. "CET", "CEST", "+0845")
    pub fn abbreviation<T: TimeZone>(&self, instant: &DateTime<T>) -> String {
        self.local_time(instant).format("%Z").to_string()
    }

    /// Total UTC offset at `instant`, in seconds
    pub fn utc_offset_seconds<T: TimeZone>(&self, instant: &DateTime<T>) -> i32 {
        utc_offset_seconds(&self.local_time(instant))
    }

    /// Whether the zone observes daylight saving time at `instant`
    pub fn is_dst<T: TimeZone>(&self, instant: &DateTime<T>) -> bool {
        is_dst(&self.local_time(instant))
    }

    /// Header date-time in the given style
    pub fn format_datetime<T: TimeZone>(
        &self,
        instant: &DateTime<T>,
        style: FormatStyle,
        military: bool,
    ) -> String {
        let local = self.local_time(instant);
        let pattern = match style {
            FormatStyle::Default if military => "%H:%M, %a %b %d, %Y",
            FormatStyle::Default => "%-I:%M%p, %a %b %d, %Y",
            FormatStyle::Iso8601 => "%Y-%m-%dT%H:%M:%S%:z",
            FormatStyle::UnixDetailed => "%a %b %e %H:%M:%S %Z %Y",
        };
        local.format(pattern).to_string()
    }

    /// Zone label for the header.
    ///
    /// `reference_offset` is the UTC offset (seconds) of the Local zone at the
    /// same instant, used by [`ZoneStyle::WithOffsetRelativeToLocal`].
    pub fn label<T: TimeZone>(
        &self,
        instant: &DateTime<T>,
        style: ZoneStyle,
        reference_offset: i32,
    ) -> String {
        let abbreviation = self.abbreviation(instant);
        let mut label = if abbreviation == self.name {
            self.name.clone()
        } else {
            format!("({}) {}", abbreviation, self.name)
        };

        let offset = self.utc_offset_seconds(instant);
        match style {
            ZoneStyle::AbbreviationOnly => {}
            ZoneStyle::WithUtcOffset => {
                label.push_str(&format!(" [{}]", format_utc_offset(offset)));
            }
            ZoneStyle::WithOffsetRelativeToLocal => {
                let delta = offset - reference_offset;
                if delta == 0 {
                    label.push_str(" [Local]");
                } else {
                    label.push_str(&format!(" [Local{}]", format_offset(delta)));
                }
            }
        }
        label
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Whether DST is in effect for this local time
pub fn is_dst(local: &DateTime<Tz>) -> bool {
    local.offset().dst_offset() != Duration::zero()
}

/// Total UTC offset of this local time, in seconds
pub fn utc_offset_seconds(local: &DateTime<Tz>) -> i32 {
    local.offset().fix().local_minus_utc()
}

/// Format an offset in seconds as "+hh:mm"
pub fn format_offset(seconds: i32) -> String {
    let sign = if seconds >= 0 { "+" } else { "-" };
    let abs_minutes = seconds.abs() / 60;
    format!("{}{:02}:{:02}", sign, abs_minutes / 60, abs_minutes % 60)
}

/// Format an offset in seconds as "UTC+hh:mm"
pub fn format_utc_offset(seconds: i32) -> String {
    format!("UTC{}", format_offset(seconds))
}

/// Resolve a local wall-clock reading in `tz`.
///
/// Ambiguous readings (a repeated hour) resolve to the earlier instant.
/// Readings inside a skipped interval do not exist and yield `None`.
pub fn resolve_local(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(naive).earliest()
}

/// The first instant of the local calendar day containing `instant`.
///
/// This is local midnight, or the end of the transition when a zone skips
/// its midnight.
pub fn local_midnight(instant: &DateTime<Tz>) -> DateTime<Tz> {
    let tz = instant.timezone();
    let start_of_day = instant.date_naive().and_time(NaiveTime::MIN);
    match resolve_local(&tz, &start_of_day) {
        Some(midnight) => midnight,
        None => first_instant_of_day(instant),
    }
}

/// Binary search for the first whole second whose local date is the date of
/// `instant`.
fn first_instant_of_day(instant: &DateTime<Tz>) -> DateTime<Tz> {
    let tz = instant.timezone();
    let date = instant.date_naive();
    let is_same_day = |timestamp: i64| {
        DateTime::from_timestamp(timestamp, 0)
            .map_or(true, |t| t.with_timezone(&tz).date_naive() >= date)
    };

    // Real time elapsed since the start of a day with a forward jump is
    // shorter than the local reading, so this bound is on the previous day.
    let mut high = instant.timestamp();
    let mut low = high - (i64::from(instant.hour()) + 2) * 3600;

    while high - low > 1 {
        let mid = low + (high - low) / 2;
        if is_same_day(mid) {
            high = mid;
        } else {
            low = mid;
        }
    }

    DateTime::from_timestamp(high, 0)
        .map(|t| t.with_timezone(&tz))
        .unwrap_or(*instant)
}

/// Get the system's local timezone as a chrono-tz Tz
///
/// Looks at `TZ`, then the `/etc/localtime` link, then `/etc/timezone`.
pub fn system_timezone() -> Option<Tz> {
    if let Ok(value) = std::env::var("TZ") {
        if let Ok(tz) = parse_timezone(value.trim_start_matches(':')) {
            return Some(tz);
        }
    }

    if let Ok(target) = fs::read_link("/etc/localtime") {
        let target = target.to_string_lossy();
        if let Some((_, name)) = target.split_once("zoneinfo/") {
            if let Ok(tz) = parse_timezone(name) {
                return Some(tz);
            }
        }
    }

    fs::read_to_string("/etc/timezone")
        .ok()
        .and_then(|contents| parse_timezone(&contents).ok())
}

/// Parse a timezone identifier into a Tz
pub fn parse_timezone(tz_str: &str) -> Result<Tz, UnknownZone> {
    let trimmed = tz_str.trim();
    trimmed
        .parse::<Tz>()
        .map_err(|_| UnknownZone(trimmed.to_string()))
}

/// One line of `-list` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneListing {
    pub name: &'static str,
    /// Standard-time abbreviation
    pub abbreviation: String,
    /// Standard-time offset, "+hh:mm"
    pub offset: String,
}

impl fmt::Display for ZoneListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>5} ({}) :: {}", self.abbreviation, self.offset, self.name)
    }
}

/// Standard-time abbreviation and base offset of `tz` around `now`
fn standard_time(tz: Tz, now: DateTime<Utc>) -> (String, i32) {
    // One of these two instants is outside any DST period
    let candidates = [now, now + Duration::days(182)];
    let local = candidates
        .iter()
        .map(|instant| instant.with_timezone(&tz))
        .find(|local| !is_dst(local))
        .unwrap_or_else(|| now.with_timezone(&tz));

    let base = local.offset().base_utc_offset().num_seconds() as i32;
    (local.format("%Z").to_string(), base)
}

/// Search timezones by identifier or standard abbreviation
/// (case-insensitive partial match). An empty query returns every zone.
///
/// Results are sorted by identifier.
pub fn search_timezones(query: &str, now: DateTime<Utc>) -> Vec<ZoneListing> {
    let query_lower = query.to_lowercase();
    let mut results: Vec<ZoneListing> = chrono_tz::TZ_VARIANTS
        .iter()
        .filter_map(|&tz| {
            let (abbreviation, offset) = standard_time(tz, now);
            let matches = query_lower.is_empty()
                || tz.name().to_lowercase().contains(&query_lower)
                || abbreviation.to_lowercase().contains(&query_lower);
            matches.then(|| ZoneListing {
                name: tz.name(),
                abbreviation,
                offset: format_offset(offset),
            })
        })
        .collect();
    results.sort_by(|a, b| a.name.cmp(b.name));
    results
}

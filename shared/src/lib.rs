//! Shared clock engine: zones, the displayed instant, display styles,
//! key bindings, and configuration loading.

pub mod clock;
pub mod config;
pub mod keymap;
pub mod style;
pub mod time_engine;

pub use clock::{Clock, RANGE_MARGIN_DAYS};
pub use config::{Config, ConfigError, ConfigFile, ConfigFileZone};
pub use keymap::{Action, Keymap, KeymapError, KeymapOverrides};
pub use style::{Cyclic, FormatStyle, ZoneStyle};
pub use time_engine::{
    format_offset, format_utc_offset, is_dst, local_midnight, parse_timezone, search_timezones,
    system_timezone, UnknownZone, Zone, ZoneListing,
};

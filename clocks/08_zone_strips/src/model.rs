//! Interaction state machine
//!
//! All display state lives in [`Model`]. Key presses and minute ticks arrive
//! as [`Msg`] values; anything the host loop must do afterwards comes back
//! as a [`Cmd`]. No I/O happens here.

use chrono::{DateTime, Utc};
use shared::{Action, Clock, Config, Cyclic, FormatStyle, Keymap, Zone, ZoneStyle};

use crate::browser::time_and_date_url;

/// Input events, serialized through the host loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A key press, as a key-string
    Key(String),
    /// The once-a-minute wake-up, carrying the wall-clock reading
    Tick(DateTime<Utc>),
}

/// Work for the host loop after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Arm the next tick for the top of the next minute
    ScheduleTick,
    /// Stop the loop
    Quit,
    /// Open a URL in the browser without waiting for it
    OpenUrl(String),
}

/// Complete state of the display
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub clock: Clock,
    /// Zones in display order; the first is the reference (Local) zone
    pub zones: Vec<Zone>,
    pub keymap: Keymap,
    /// Title line
    pub header: String,
    /// 0 = none, else 1-based zone index
    pub highlighted: usize,
    pub show_dates: bool,
    pub show_help: bool,
    /// 24-hour time in headers
    pub is_military: bool,
    pub format_style: FormatStyle,
    pub zone_style: ZoneStyle,
    /// Follow the wall clock on every tick
    pub watch: bool,
    /// False when rendering once and exiting
    pub interactive: bool,
}

impl Model {
    pub fn new(config: Config, clock: Clock) -> Self {
        Self {
            clock,
            zones: config.zones,
            keymap: config.keymap,
            header: config.header,
            highlighted: 0,
            show_dates: false,
            show_help: false,
            is_military: false,
            format_style: FormatStyle::default(),
            zone_style: ZoneStyle::default(),
            watch: false,
            interactive: true,
        }
    }

    /// First command for the host loop: quit after the first render, or
    /// start ticking
    pub fn init(&self) -> Cmd {
        if self.interactive {
            Cmd::ScheduleTick
        } else {
            Cmd::Quit
        }
    }

    /// Apply one message and return what the host loop should do next
    pub fn update(&mut self, msg: Msg) -> Option<Cmd> {
        match msg {
            Msg::Key(key) => {
                let action = self.keymap.action_for(&key)?;
                log::debug!("Key {:?} -> {:?}", key, action);
                self.apply(action)
            }
            Msg::Tick(now) => {
                if self.watch && self.clock.tracks_wall_clock() {
                    let tz = self.clock.instant().timezone();
                    self.clock = Clock::synced(now, tz);
                }
                Some(Cmd::ScheduleTick)
            }
        }
    }

    fn apply(&mut self, action: Action) -> Option<Cmd> {
        match action {
            Action::Quit => return Some(Cmd::Quit),
            Action::PrevMinute => self.clock = self.clock.add_minutes(-1),
            Action::NextMinute => self.clock = self.clock.add_minutes(1),
            Action::ZeroMinute => self.clock = self.clock.zero_minutes(),
            Action::PrevHour => self.clock = self.clock.add_hours(-1),
            Action::NextHour => self.clock = self.clock.add_hours(1),
            Action::PrevDay => self.clock = self.clock.add_days(-1),
            Action::NextDay => self.clock = self.clock.add_days(1),
            Action::PrevWeek => self.clock = self.clock.add_days(-7),
            Action::NextWeek => self.clock = self.clock.add_days(7),
            Action::PrevLine => {
                let modulo = self.zones.len() + 1;
                self.highlighted = (self.highlighted + modulo - 1) % modulo;
            }
            Action::NextLine => {
                let modulo = self.zones.len() + 1;
                self.highlighted = (self.highlighted + 1) % modulo;
            }
            Action::PrevFormatStyle => self.format_style = self.format_style.previous(),
            Action::NextFormatStyle => self.format_style = self.format_style.next(),
            Action::PrevZoneStyle => self.zone_style = self.zone_style.previous(),
            Action::NextZoneStyle => self.zone_style = self.zone_style.next(),
            Action::OpenWeb => {
                return Some(Cmd::OpenUrl(time_and_date_url(&self.clock.instant())));
            }
            Action::Now => self.clock = Clock::now(self.clock.instant().timezone()),
            Action::ToggleDate => self.show_dates = !self.show_dates,
            Action::Help => self.show_help = !self.show_help,
        }
        None
    }
}

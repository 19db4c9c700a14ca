//! Keymap - logical actions and the key-strings bound to them
//!
//! Key-strings are the terminal layer's names for key presses: `"q"`,
//! `"ctrl+c"`, `"esc"`, `"left"`, `"shift+up"`, `"K"`, `"space"`.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use thiserror::Error;

/// Everything a key press can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Quit,
    PrevMinute,
    NextMinute,
    ZeroMinute,
    PrevHour,
    NextHour,
    PrevDay,
    NextDay,
    PrevWeek,
    NextWeek,
    PrevLine,
    NextLine,
    PrevFormatStyle,
    NextFormatStyle,
    PrevZoneStyle,
    NextZoneStyle,
    OpenWeb,
    Now,
    ToggleDate,
    Help,
}

impl Action {
    pub const ALL: [Action; 20] = [
        Action::Quit,
        Action::PrevMinute,
        Action::NextMinute,
        Action::ZeroMinute,
        Action::PrevHour,
        Action::NextHour,
        Action::PrevDay,
        Action::NextDay,
        Action::PrevWeek,
        Action::NextWeek,
        Action::PrevLine,
        Action::NextLine,
        Action::PrevFormatStyle,
        Action::NextFormatStyle,
        Action::PrevZoneStyle,
        Action::NextZoneStyle,
        Action::OpenWeb,
        Action::Now,
        Action::ToggleDate,
        Action::Help,
    ];

    /// Name of the action in the `[keymaps]` table of the config file
    pub fn config_name(self) -> &'static str {
        match self {
            Action::Quit => "quit",
            Action::PrevMinute => "prev_minute",
            Action::NextMinute => "next_minute",
            Action::ZeroMinute => "zero_minute",
            Action::PrevHour => "prev_hour",
            Action::NextHour => "next_hour",
            Action::PrevDay => "prev_day",
            Action::NextDay => "next_day",
            Action::PrevWeek => "prev_week",
            Action::NextWeek => "next_week",
            Action::PrevLine => "prev_line",
            Action::NextLine => "next_line",
            Action::PrevFormatStyle => "prev_format_style",
            Action::NextFormatStyle => "next_format_style",
            Action::PrevZoneStyle => "prev_zone_style",
            Action::NextZoneStyle => "next_zone_style",
            Action::OpenWeb => "open_web",
            Action::Now => "now",
            Action::ToggleDate => "toggle_date",
            Action::Help => "help",
        }
    }

    fn default_keys(self) -> &'static [&'static str] {
        match self {
            Action::Quit => &["q", "ctrl+c", "esc"],
            Action::PrevMinute => &["-"],
            Action::NextMinute => &["+", "="],
            Action::ZeroMinute => &["0"],
            Action::PrevHour => &["h", "left"],
            Action::NextHour => &["l", "right"],
            Action::PrevDay => &["k", "up"],
            Action::NextDay => &["j", "down"],
            Action::PrevWeek => &["p"],
            Action::NextWeek => &["n"],
            Action::PrevLine => &["K", "shift+up"],
            Action::NextLine => &["J", "shift+down"],
            Action::PrevFormatStyle => &["F"],
            Action::NextFormatStyle => &["f"],
            Action::PrevZoneStyle => &["Z"],
            Action::NextZoneStyle => &["z"],
            Action::OpenWeb => &["o"],
            Action::Now => &["t"],
            Action::ToggleDate => &["d"],
            Action::Help => &["?"],
        }
    }
}

/// Keymap validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeymapError {
    /// The same key-string is bound to more than one action
    #[error("Key(s) mapped multiple times in config: {}", .0.join(", "))]
    Conflict(Vec<String>),
}

/// Per-action key lists as written in the `[keymaps]` table.
///
/// An action left out keeps its default keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KeymapOverrides {
    pub quit: Option<Vec<String>>,
    pub prev_minute: Option<Vec<String>>,
    pub next_minute: Option<Vec<String>>,
    pub zero_minute: Option<Vec<String>>,
    pub prev_hour: Option<Vec<String>>,
    pub next_hour: Option<Vec<String>>,
    pub prev_day: Option<Vec<String>>,
    pub next_day: Option<Vec<String>>,
    pub prev_week: Option<Vec<String>>,
    pub next_week: Option<Vec<String>>,
    pub prev_line: Option<Vec<String>>,
    pub next_line: Option<Vec<String>>,
    pub prev_format_style: Option<Vec<String>>,
    pub next_format_style: Option<Vec<String>>,
    pub prev_zone_style: Option<Vec<String>>,
    pub next_zone_style: Option<Vec<String>>,
    pub open_web: Option<Vec<String>>,
    pub now: Option<Vec<String>>,
    pub toggle_date: Option<Vec<String>>,
    pub help: Option<Vec<String>>,
}

impl KeymapOverrides {
    fn get(&self, action: Action) -> Option<&Vec<String>> {
        match action {
            Action::Quit => self.quit.as_ref(),
            Action::PrevMinute => self.prev_minute.as_ref(),
            Action::NextMinute => self.next_minute.as_ref(),
            Action::ZeroMinute => self.zero_minute.as_ref(),
            Action::PrevHour => self.prev_hour.as_ref(),
            Action::NextHour => self.next_hour.as_ref(),
            Action::PrevDay => self.prev_day.as_ref(),
            Action::NextDay => self.next_day.as_ref(),
            Action::PrevWeek => self.prev_week.as_ref(),
            Action::NextWeek => self.next_week.as_ref(),
            Action::PrevLine => self.prev_line.as_ref(),
            Action::NextLine => self.next_line.as_ref(),
            Action::PrevFormatStyle => self.prev_format_style.as_ref(),
            Action::NextFormatStyle => self.next_format_style.as_ref(),
            Action::PrevZoneStyle => self.prev_zone_style.as_ref(),
            Action::NextZoneStyle => self.next_zone_style.as_ref(),
            Action::OpenWeb => self.open_web.as_ref(),
            Action::Now => self.now.as_ref(),
            Action::ToggleDate => self.toggle_date.as_ref(),
            Action::Help => self.help.as_ref(),
        }
    }
}

/// Validated bindings from actions to key-strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    bindings: BTreeMap<Action, Vec<String>>,
    lookup: BTreeMap<String, Action>,
}

impl Default for Keymap {
    fn default() -> Self {
        let bindings: BTreeMap<Action, Vec<String>> = Action::ALL
            .iter()
            .map(|&action| {
                let keys: Vec<String> =
                    action.default_keys().iter().map(|k| k.to_string()).collect();
                (action, keys)
            })
            .collect();
        let (lookup, _) = index(&bindings);
        Self { bindings, lookup }
    }
}

impl Keymap {
    /// Defaults, with every action present in `overrides` replaced
    pub fn with_overrides(overrides: &KeymapOverrides) -> Result<Self, KeymapError> {
        let bindings = Action::ALL
            .iter()
            .map(|&action| {
                let keys = match overrides.get(action) {
                    Some(keys) => {
                        log::debug!("Keymap override {} = {:?}", action.config_name(), keys);
                        keys.clone()
                    }
                    None => action.default_keys().iter().map(|k| k.to_string()).collect(),
                };
                (action, keys)
            })
            .collect();
        Self::validated(bindings)
    }

    fn validated(bindings: BTreeMap<Action, Vec<String>>) -> Result<Self, KeymapError> {
        let (lookup, conflicts) = index(&bindings);
        if !conflicts.is_empty() {
            return Err(KeymapError::Conflict(conflicts.into_iter().collect()));
        }
        Ok(Self { bindings, lookup })
    }

    /// The action bound to a key-string, if any
    pub fn action_for(&self, key: &str) -> Option<Action> {
        self.lookup.get(key).copied()
    }

    /// All keys bound to `action`
    pub fn keys(&self, action: Action) -> &[String] {
        self.bindings.get(&action).map_or(&[], Vec::as_slice)
    }

    /// The first key bound to `action`, for help text
    pub fn primary_key(&self, action: Action) -> &str {
        self.keys(action).first().map_or("", String::as_str)
    }
}

/// Reverse index from key-string to action, plus keys claimed by two actions
fn index(
    bindings: &BTreeMap<Action, Vec<String>>,
) -> (BTreeMap<String, Action>, BTreeSet<String>) {
    let mut lookup = BTreeMap::new();
    let mut conflicts = BTreeSet::new();
    for (&action, keys) in bindings {
        for key in keys {
            if let Some(previous) = lookup.insert(key.clone(), action) {
                if previous != action {
                    conflicts.insert(key.clone());
                }
            }
        }
    }
    (lookup, conflicts)
}

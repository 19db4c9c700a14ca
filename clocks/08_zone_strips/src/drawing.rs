//! Drawing module - zone headers, hour strips, markers, and the status footer
//!
//! Everything is rendered to lines of text. Styling goes through [`Theme`],
//! which emits crossterm ANSI sequences or nothing at all, so the plain
//! theme gives output that can be compared byte for byte.

use chrono::Timelike;
use crossterm::style::{Color, Stylize};
use crossterm::tty::IsTty;
use shared::{Action, Keymap, Zone};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::model::Model;
use crate::strips::{zone_strips, Alignment, Marker, ZoneStrip};

/// Width of the strip area and the status footer
pub const UI_WIDTH: usize = 94;
/// Columns kept free between a zone label and its date-time
pub const MIN_ZONE_HEADER_PADDING: usize = 6;
/// Headers never stretch past this many columns
pub const MAX_ZONE_HEADER_COLUMNS: usize = UI_WIDTH + MIN_ZONE_HEADER_PADDING;

const CELL_WIDTH: usize = 4;
const MARGIN: &str = "  ";
const HIGHLIGHT_MARGIN: &str = "▸ ";

/// Terminal palette, with variants for dark and light backgrounds
pub mod colors {
    use crossterm::style::Color;

    pub const MORNING_DARK: Color = Color::Rgb { r: 0x98, g: 0xE1, b: 0xD8 };
    pub const MORNING_LIGHT: Color = Color::Rgb { r: 0x35, g: 0xB6, b: 0xA6 };
    pub const DAY_DARK: Color = Color::Rgb { r: 0xE8, g: 0xC6, b: 0x4D };
    pub const DAY_LIGHT: Color = Color::Rgb { r: 0xFA, g: 0x8F, b: 0x2D };
    pub const EVENING_DARK: Color = Color::Rgb { r: 0xC9, g: 0x5F, b: 0x48 };
    pub const EVENING_LIGHT: Color = Color::Rgb { r: 0xFC, g: 0x64, b: 0x42 };
    pub const NIGHT_DARK: Color = Color::Rgb { r: 0x59, g: 0x57, b: 0xC9 };
    pub const NIGHT_LIGHT: Color = Color::Rgb { r: 0x66, g: 0x4F, b: 0xC3 };

    /// Hour label under the cursor
    pub const CURSOR_DARK: Color = Color::Rgb { r: 0x26, g: 0x26, b: 0x26 };
    pub const CURSOR_LIGHT: Color = Color::Rgb { r: 0xF1, g: 0xF1, b: 0xF1 };

    pub const TEXT_DARK: Color = Color::Rgb { r: 0xEC, g: 0xEA, b: 0xD9 };
    pub const TEXT_LIGHT: Color = Color::Rgb { r: 0x32, g: 0x31, b: 0x2B };
    pub const DATETIME_DARK: Color = Color::Rgb { r: 0x75, g: 0x75, b: 0x75 };
    pub const DATETIME_LIGHT: Color = Color::Rgb { r: 0x77, g: 0x72, b: 0x66 };
    pub const STATUS_DARK: Color = Color::Rgb { r: 0x60, g: 0x5C, b: 0x5A };
    pub const STATUS_LIGHT: Color = Color::Rgb { r: 0x93, g: 0x91, b: 0x83 };
    pub const MARKER_DARK: Color = Color::Rgb { r: 0x7B, g: 0x75, b: 0x73 };
    pub const MARKER_LIGHT: Color = Color::Rgb { r: 0x77, g: 0x72, b: 0x66 };
}

/// How output is styled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// Emit ANSI styling at all
    pub colored: bool,
    pub dark_background: bool,
}

impl Theme {
    /// No styling; the cursor is marked with `*`
    pub fn plain() -> Self {
        Self {
            colored: false,
            dark_background: true,
        }
    }

    /// Color when stdout is a terminal and `NO_COLOR` is unset; background
    /// brightness from `COLORFGBG`
    pub fn detect() -> Self {
        let colored = std::env::var_os("NO_COLOR").is_none()
            && std::env::var("TERM").map_or(true, |term| term != "dumb")
            && std::io::stdout().is_tty();
        let dark_background = std::env::var("COLORFGBG").map_or(true, |v| background_is_dark(&v));
        log::debug!("Theme: colored={} dark={}", colored, dark_background);
        Self {
            colored,
            dark_background,
        }
    }

    fn pick(&self, dark: Color, light: Color) -> Color {
        if self.dark_background {
            dark
        } else {
            light
        }
    }

    /// Color for an hour of the day
    pub fn hour_color(&self, hour: u32) -> Color {
        match hour {
            7..=8 => self.pick(colors::MORNING_DARK, colors::MORNING_LIGHT),
            9..=17 => self.pick(colors::DAY_DARK, colors::DAY_LIGHT),
            18..=19 => self.pick(colors::EVENING_DARK, colors::EVENING_LIGHT),
            _ => self.pick(colors::NIGHT_DARK, colors::NIGHT_LIGHT),
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.colored {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn text(&self) -> Color {
        self.pick(colors::TEXT_DARK, colors::TEXT_LIGHT)
    }
}

/// Last field of `COLORFGBG` ("fg;bg"); 7 and 15 are light backgrounds
fn background_is_dark(colorfgbg: &str) -> bool {
    match colorfgbg.rsplit(';').next().map(str::parse::<u8>) {
        Some(Ok(background)) => !matches!(background, 7 | 15),
        _ => true,
    }
}

/// Columns taken by `text` on a terminal
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Longest prefix of `text` that fits in `width` columns
fn truncate_to_width(text: &str, width: usize) -> String {
    let mut used = 0;
    text.chars()
        .take_while(|&c| {
            used += UnicodeWidthChar::width(c).unwrap_or(0);
            used <= width
        })
        .collect()
}

/// Truncate or pad `text` to exactly `width` columns
fn fit_to_width(text: &str, width: usize) -> String {
    let mut fitted = truncate_to_width(text, width);
    let fill = width.saturating_sub(display_width(&fitted));
    fitted.push_str(&" ".repeat(fill));
    fitted
}

/// The whole screen as a single string
pub fn view(model: &Model, width: Option<usize>, theme: &Theme) -> String {
    render_lines(model, width, theme).join("\n")
}

/// The whole screen, one entry per line.
///
/// `width` is the terminal width when known; headers are right-aligned to
/// it, capped at [`MAX_ZONE_HEADER_COLUMNS`].
pub fn render_lines(model: &Model, width: Option<usize>, theme: &Theme) -> Vec<String> {
    let instant = model.clock.instant();
    let header_width = width
        .unwrap_or(MAX_ZONE_HEADER_COLUMNS)
        .min(MAX_ZONE_HEADER_COLUMNS);
    let reference_offset = model
        .zones
        .first()
        .map_or(0, |zone| zone.utc_offset_seconds(&instant));
    let (alignment, strips) = zone_strips(&model.zones, &instant);

    let mut lines = vec![
        String::new(),
        format!("{}{}", MARGIN, theme.paint(&model.header, theme.text())),
        String::new(),
    ];

    for (index, (zone, strip)) in model.zones.iter().zip(&strips).enumerate() {
        let header = ZoneHeader {
            zone,
            highlighted: model.highlighted == index + 1,
            reference_offset,
        };
        lines.push(header.render(model, header_width, theme));
        lines.push(hours_line(strip, &alignment, theme));
        lines.push(if model.show_dates {
            markers_line(strip, theme)
        } else {
            String::new()
        });
    }

    if model.interactive {
        let color = theme.pick(colors::STATUS_DARK, colors::STATUS_LIGHT);
        for line in status_lines(&model.keymap, model.show_help) {
            let fitted = fit_to_width(&format!("{}{}", MARGIN, line), UI_WIDTH);
            lines.push(theme.paint(&fitted, color));
        }
    }

    lines
}

struct ZoneHeader<'a> {
    zone: &'a Zone,
    highlighted: bool,
    /// UTC offset of the reference zone, for relative labels
    reference_offset: i32,
}

impl ZoneHeader<'_> {
    fn render(&self, model: &Model, header_width: usize, theme: &Theme) -> String {
        let instant = model.clock.instant();
        let emoji = self.zone.clock_emoji(&instant);
        let label = self
            .zone
            .label(&instant, model.zone_style, self.reference_offset);
        let datetime = self
            .zone
            .format_datetime(&instant, model.format_style, model.is_military);

        let used = display_width(emoji) + display_width(&label) + display_width(&datetime);
        let padding = " ".repeat(header_width.saturating_sub(used + MIN_ZONE_HEADER_PADDING));

        if self.highlighted {
            let text = format!("{} {} {}{}", emoji, label, padding, datetime);
            let text = if theme.colored {
                text.as_str().with(theme.text()).reverse().to_string()
            } else {
                text
            };
            return format!("{}{}", HIGHLIGHT_MARGIN, text);
        }

        let datetime_color = theme.pick(colors::DATETIME_DARK, colors::DATETIME_LIGHT);
        format!(
            "{}{} {} {}{}",
            MARGIN,
            emoji,
            theme.paint(&label, theme.text()),
            padding,
            theme.paint(&datetime, datetime_color)
        )
    }
}

fn hours_line(strip: &ZoneStrip, alignment: &Alignment, theme: &Theme) -> String {
    let mut line = String::from(MARGIN);
    for (column, cell) in strip.cells.iter().enumerate() {
        let hour = cell.local.hour();
        let label = format!("{:>2}", hour);
        let color = theme.hour_color(hour);
        if column != alignment.cursor_column {
            line.push_str(&theme.paint(&label, color));
            line.push_str("  ");
        } else if theme.colored {
            let cursor_text = theme.pick(colors::CURSOR_DARK, colors::CURSOR_LIGHT);
            line.push_str(&label.as_str().with(cursor_text).on(color).bold().to_string());
            line.push_str("  ");
        } else {
            line.push_str(&label);
            line.push_str("* ");
        }
    }
    line
}

fn marker_text(marker: Marker) -> String {
    match marker {
        Marker::DateChange(date) => format!("📆 {}", date.format("%a %d")),
        Marker::DstStart => "=DST".to_string(),
        Marker::DstEnd => "≠DST".to_string(),
    }
}

/// Markers placed under their columns; a marker cuts off the one before it
fn markers_line(strip: &ZoneStrip, theme: &Theme) -> String {
    let mut placed: Vec<(usize, String)> = Vec::new();
    for (column, marker) in strip.markers() {
        let start = column * CELL_WIDTH;
        if let Some((previous_start, previous_text)) = placed.last_mut() {
            let room = start - *previous_start;
            if display_width(previous_text) > room {
                *previous_text = truncate_to_width(previous_text, room);
            }
        }
        placed.push((start, marker_text(marker)));
    }

    let color = theme.pick(colors::MARKER_DARK, colors::MARKER_LIGHT);
    let mut line = String::from(MARGIN);
    let mut position = 0;
    for (start, text) in placed {
        line.push_str(&" ".repeat(start.saturating_sub(position)));
        line.push_str(&theme.paint(&text, color));
        position = start.max(position) + display_width(&text);
    }
    line
}

/// Footer text: a short hint, or the full key reference with `show_help`
pub fn status_lines(keymap: &Keymap, show_help: bool) -> Vec<String> {
    let key = |action| keymap.primary_key(action);
    if !show_help {
        return vec![format!(
            "{}: help, {}: quit",
            key(Action::Help),
            key(Action::Quit)
        )];
    }
    vec![
        format!(
            "{}: help, {}/{}/{}: minutes, {}/{}: hours, {}/{}: days, {}/{}: weeks, {}: go to now",
            key(Action::Help),
            key(Action::PrevMinute),
            key(Action::NextMinute),
            key(Action::ZeroMinute),
            key(Action::PrevHour),
            key(Action::NextHour),
            key(Action::PrevDay),
            key(Action::NextDay),
            key(Action::PrevWeek),
            key(Action::NextWeek),
            key(Action::Now),
        ),
        format!(
            "{}: quit, {}: toggle dates, {}: open in web, {}/{}: highlight, {}/{}: format style, {}/{}: zone style",
            key(Action::Quit),
            key(Action::ToggleDate),
            key(Action::OpenWeb),
            key(Action::PrevLine),
            key(Action::NextLine),
            key(Action::NextFormatStyle),
            key(Action::PrevFormatStyle),
            key(Action::NextZoneStyle),
            key(Action::PrevZoneStyle),
        ),
    ]
}

//! Terminal host loop
//!
//! Owns the screen while interactive: raw mode, alternate screen, hidden
//! cursor. Key presses and minute ticks are fed to the model one at a time
//! and the screen is redrawn after each.

use std::io::{self, Write};
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Timelike, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue, terminal};

use crate::browser;
use crate::drawing::{render_lines, Theme};
use crate::model::{Cmd, Model, Msg};

const MINUTE: StdDuration = StdDuration::from_secs(60);
/// Poll interval while no tick is armed
const IDLE_POLL: StdDuration = StdDuration::from_secs(3600);

/// Restores the terminal when dropped, including on early return
struct ScreenGuard;

impl ScreenGuard {
    fn enter(stdout: &mut impl Write) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let guard = Self;
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
        Ok(guard)
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

enum Input {
    Msg(Msg),
    /// Terminal resized; nothing for the model
    Redraw,
}

/// Terminal width from `COLUMNS`, else from the terminal itself
pub fn terminal_width() -> Option<usize> {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|columns| columns.trim().parse().ok())
        .or_else(|| terminal::size().ok().map(|(width, _)| usize::from(width)))
}

/// Name a key press the way the keymap does (`"q"`, `"ctrl+c"`, `"shift+up"`)
pub fn key_string(event: &KeyEvent) -> Option<String> {
    let mut modifiers = event.modifiers;
    let base = match event.code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => {
            // Shift is already in the character
            modifiers.remove(KeyModifiers::SHIFT);
            c.to_string()
        }
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::BackTab => {
            modifiers.insert(KeyModifiers::SHIFT);
            "tab".to_string()
        }
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Delete => "delete".to_string(),
        KeyCode::Insert => "insert".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::PageUp => "pgup".to_string(),
        KeyCode::PageDown => "pgdown".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::F(n) => format!("f{}", n),
        _ => return None,
    };

    let mut key = String::new();
    if modifiers.contains(KeyModifiers::CONTROL) {
        key.push_str("ctrl+");
    }
    if modifiers.contains(KeyModifiers::ALT) {
        key.push_str("alt+");
    }
    if modifiers.contains(KeyModifiers::SHIFT) {
        key.push_str("shift+");
    }
    key.push_str(&base);
    Some(key)
}

/// Time left until the next whole minute
fn until_next_minute(now: DateTime<Utc>) -> StdDuration {
    let into_minute =
        StdDuration::new(u64::from(now.second()), now.nanosecond().min(999_999_999));
    MINUTE.saturating_sub(into_minute)
}

/// Run the interactive display until the model asks to quit
pub fn run(mut model: Model, theme: &Theme) -> io::Result<()> {
    let mut stdout = io::stdout();
    let _screen = ScreenGuard::enter(&mut stdout)?;

    let mut next_tick = None;
    let mut command = Some(model.init());
    loop {
        match command.take() {
            Some(Cmd::Quit) => break,
            Some(Cmd::ScheduleTick) => {
                next_tick = Some(Instant::now() + until_next_minute(Utc::now()));
            }
            Some(Cmd::OpenUrl(url)) => {
                if let Err(e) = browser::open_url(&url) {
                    log::warn!("Could not open {}: {}", url, e);
                }
            }
            None => {}
        }

        draw(&mut stdout, &model, theme)?;

        match wait_for_input(next_tick)? {
            Input::Msg(msg) => {
                if matches!(msg, Msg::Tick(_)) {
                    next_tick = None;
                }
                command = model.update(msg);
            }
            Input::Redraw => {}
        }
    }

    log::debug!("Quit");
    Ok(())
}

fn draw(stdout: &mut impl Write, model: &Model, theme: &Theme) -> io::Result<()> {
    let lines = render_lines(model, terminal_width(), theme);
    queue!(stdout, cursor::MoveTo(0, 0), terminal::Clear(ClearType::All))?;
    // Raw mode: newlines do not return the carriage
    stdout.write_all(lines.join("\r\n").as_bytes())?;
    stdout.flush()
}

fn wait_for_input(deadline: Option<Instant>) -> io::Result<Input> {
    loop {
        let timeout = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Ok(Input::Msg(Msg::Tick(Utc::now())));
                }
                deadline - now
            }
            None => IDLE_POLL,
        };

        if !event::poll(timeout)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                if let Some(key) = key_string(&key) {
                    return Ok(Input::Msg(Msg::Key(key)));
                }
            }
            Event::Resize(_, _) => return Ok(Input::Redraw),
            _ => {}
        }
    }
}

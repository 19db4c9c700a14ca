//! Opening the displayed instant on timeanddate.com

use std::io;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use chrono::{DateTime, TimeZone, Utc};

const CONVERTER_URL: &str = "https://www.timeanddate.com/worldclock/converter.html";

/// Converter page for `instant`, keyed on its UTC reading
pub fn time_and_date_url<T: TimeZone>(instant: &DateTime<T>) -> String {
    let utc = instant.with_timezone(&Utc);
    format!("{}?iso={}&p1=1440", CONVERTER_URL, utc.format("%Y%m%dT%H%M%S"))
}

/// Hand `url` to the platform opener without waiting for it
pub fn open_url(url: &str) -> io::Result<()> {
    let mut command = opener(url)?;
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    spawn_reaped(&mut command)?;
    log::debug!("Opened {}", url);
    Ok(())
}

/// Spawn `command` and wait for it on a detached thread so it is reaped
fn spawn_reaped(command: &mut Command) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = command.spawn()?;
    let pid = child.id();
    Ok(thread::spawn(move || {
        let status = child.wait();
        match &status {
            Ok(status) => log::debug!("Opener {} exited: {}", pid, status),
            Err(e) => log::warn!("Could not wait for opener {}: {}", pid, e),
        }
        status
    }))
}

fn opener(url: &str) -> io::Result<Command> {
    let mut command = if cfg!(target_os = "linux") {
        Command::new("xdg-open")
    } else if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("rundll32");
        command.arg("url.dll,FileProtocolHandler");
        command
    } else {
        return Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "unsupported platform",
        ));
    };
    command.arg(url);
    Ok(command)
}

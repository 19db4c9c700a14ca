//! Configuration loading
//!
//! Zones and key bindings come from three places: positional arguments, the
//! `TZ_LIST` environment variable, and a TOML file in the user's config
//! directory. Every zone is resolved here, so a bad identifier stops the
//! program before anything is drawn.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

use crate::keymap::{Keymap, KeymapError, KeymapOverrides};
use crate::time_engine::{UnknownZone, Zone};

/// Environment variable holding `id[,name]` zone entries separated by `;`
pub const TZ_LIST_ENV: &str = "TZ_LIST";

/// Title line used when the config file sets none
pub const DEFAULT_HEADER: &str = "What time is it?";

const CONFIG_FILE_NAME: &str = "conf.toml";

/// Error type for configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error while reading config
    #[error("File error: {0}")]
    Io(#[from] io::Error),
    /// Failed to parse config file
    #[error("Parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// A configured zone is not in the timezone database
    #[error("looking up zone {}: {0}", .0.identifier())]
    Zone(#[from] UnknownZone),
    /// Conflicting key bindings
    #[error(transparent)]
    Keymap(#[from] KeymapError),
}

/// The TOML configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Title line above the zones
    pub header: Option<String>,
    pub zones: Vec<ConfigFileZone>,
    pub keymaps: KeymapOverrides,
}

/// A single zone entry in the TOML file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigFileZone {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Everything the display needs from configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub header: String,
    /// Zones in display order; the first is always Local
    pub zones: Vec<Zone>,
    pub keymap: Keymap,
}

/// Get the configuration directory (`~/.config/tz` on Linux)
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tz").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the configuration file path
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Load a configuration file
///
/// Returns `None` if the file doesn't exist.
/// Returns an error if the file exists but can't be read or parsed.
pub fn load_config_file(path: &Path) -> Result<Option<ConfigFile>, ConfigError> {
    if !path.exists() {
        log::debug!("Config file '{}' not found. Skipping...", path.display());
        return Ok(None);
    }

    let contents = fs::read_to_string(path)?;
    let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Loaded config file '{}'", path.display());
    Ok(Some(config))
}

/// Parse an `id[,name]` zone entry. An empty identifier means UTC.
pub fn parse_zone_entry(entry: &str) -> Result<Zone, UnknownZone> {
    let (id, name) = match entry.split_once(',') {
        Some((id, name)) => (id.trim(), Some(name)),
        None => (entry.trim(), None),
    };
    let id = if id.is_empty() { "UTC" } else { id };
    Zone::new(id, name)
}

impl Config {
    /// Load configuration from the environment and the default config file
    pub fn load(args: &[String]) -> Result<Self, ConfigError> {
        let file = match config_path() {
            Some(path) => load_config_file(&path)?,
            None => {
                log::debug!("Could not determine config directory");
                None
            }
        };
        let tz_list = std::env::var(TZ_LIST_ENV).ok();
        Self::assemble(Zone::local(), args, tz_list.as_deref(), file)
    }

    /// Build the configuration from already-gathered sources.
    ///
    /// Zones after Local come from the first non-empty source among `args`,
    /// `tz_list`, and the file; with none of them the list is Local and UTC.
    pub fn assemble(
        local: Zone,
        args: &[String],
        tz_list: Option<&str>,
        file: Option<ConfigFile>,
    ) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_default();

        let mut zones = vec![local];
        if !args.is_empty() {
            log::debug!("Zones from arguments: {:?}", args);
            for entry in args {
                zones.push(parse_zone_entry(entry)?);
            }
        } else if let Some(list) = tz_list.filter(|list| !list.is_empty()) {
            log::debug!("Zones from {}: {}", TZ_LIST_ENV, list);
            for entry in list.split(';') {
                zones.push(parse_zone_entry(entry)?);
            }
        } else if !file.zones.is_empty() {
            for entry in &file.zones {
                zones.push(Zone::new(&entry.id, entry.name.as_deref())?);
            }
        } else {
            zones.push(parse_zone_entry("UTC")?);
        }

        let keymap = Keymap::with_overrides(&file.keymaps)?;
        let header = file.header.unwrap_or_else(|| DEFAULT_HEADER.to_string());

        Ok(Self {
            header,
            zones,
            keymap,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::Action;
    use std::io::Write;

    fn local() -> Zone {
        Zone::from_tz(chrono_tz::Tz::UTC, "Local")
    }

    fn names(config: &Config) -> String {
        config
            .zones
            .iter()
            .map(|zone| zone.name().to_string())
            .collect::<Vec<_>>()
            .join(";")
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_config_path() {
        if let Some(path) = config_path() {
            assert!(path.ends_with("tz/conf.toml"));
        }
    }

    #[test]
    fn test_zone_sources_precedence() {
        let args = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let cases: [(Vec<String>, Option<&str>, &str); 5] = [
            (args(&[]), None, "Local;UTC"),
            (args(&["GMT"]), Some("UTC"), "Local;GMT"),
            (args(&["", "GMT", ""]), Some("UTC"), "Local;UTC;GMT;UTC"),
            (args(&[]), Some("GMT"), "Local;GMT"),
            (args(&[]), Some(";GMT;"), "Local;UTC;GMT;UTC"),
        ];
        for (args, tz_list, expected) in cases {
            let config = Config::assemble(local(), &args, tz_list, None).unwrap();
            assert_eq!(names(&config), expected, "{:?} {:?}", args, tz_list);
        }
    }

    #[test]
    fn test_unknown_zone_in_list() {
        let err = Config::assemble(local(), &[], Some("Unknown"), None).unwrap_err();
        assert!(matches!(err, ConfigError::Zone(_)));
        assert_eq!(
            err.to_string(),
            "looking up zone Unknown: unknown time zone Unknown"
        );
    }

    #[test]
    fn test_zone_entry_custom_names() {
        assert_eq!(parse_zone_entry("Europe/Paris,bonjour").unwrap().name(), "bonjour");
        assert_eq!(
            parse_zone_entry("America/Mexico_City,hola").unwrap().name(),
            "hola"
        );
        assert!(parse_zone_entry("America/Invalid").is_err());
        assert!(parse_zone_entry(" Australia/Sydney").is_ok());
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config_file(&dir.path().join("conf.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_empty_config_file() {
        let file = write_config("");
        let loaded = load_config_file(file.path()).unwrap().unwrap();
        assert!(loaded.zones.is_empty());
        assert!(loaded.header.is_none());
    }

    #[test]
    fn test_config_file_zones_and_keymaps() {
        let file = write_config(
            r#"
header = "Team clocks"

[[zones]]
id = "Europe/Paris"
name = "Paris"

[[zones]]
id = "Asia/Kolkata"

[keymaps]
open_web = ["o", "w"]
"#,
        );
        let loaded = load_config_file(file.path()).unwrap();
        let config = Config::assemble(local(), &[], None, loaded).unwrap();
        assert_eq!(config.header, "Team clocks");
        assert_eq!(names(&config), "Local;Paris;Asia/Kolkata");
        assert_eq!(config.keymap.action_for("w"), Some(Action::OpenWeb));
    }

    #[test]
    fn test_environment_overrides_file_zones() {
        let file = write_config("[[zones]]\nid = \"Europe/Paris\"\n");
        let loaded = load_config_file(file.path()).unwrap();
        let config = Config::assemble(local(), &[], Some("Asia/Tokyo"), loaded).unwrap();
        assert_eq!(names(&config), "Local;Asia/Tokyo");
        assert_eq!(config.header, DEFAULT_HEADER);
    }

    #[test]
    fn test_invalid_config_file() {
        let file = write_config("[[zones]\nid = 1");
        let err = load_config_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("Parsing "));
    }

    #[test]
    fn test_unknown_zone_in_file() {
        let file = write_config("[[zones]]\nid = \"!\"\n");
        let loaded = load_config_file(file.path()).unwrap();
        let err = Config::assemble(local(), &[], None, loaded).unwrap_err();
        assert!(err.to_string().contains("unknown time zone !"));
    }

    #[test]
    fn test_duplicate_keys_in_file() {
        let file = write_config("[keymaps]\nhelp = [\"q\"]\n");
        let loaded = load_config_file(file.path()).unwrap();
        let err = Config::assemble(local(), &[], None, loaded).unwrap_err();
        assert!(matches!(err, ConfigError::Keymap(_)));
        assert_eq!(err.to_string(), "Key(s) mapped multiple times in config: q");
    }
}

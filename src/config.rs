use anyhow::{Context, Result};
use icsdrop_core::format::{FormatOptions, HourCycle, Zone};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file at ~/.config/icsdrop/config.toml
///
/// ```toml
/// feed = "https://example.com/basic.ics"
/// timezone = "America/New_York"
/// hour_cycle = "h12"
/// download_dir = "~/Downloads"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Feed URL or local path
    pub feed: Option<String>,

    /// IANA timezone name, or "local"
    pub timezone: Option<String>,

    #[serde(default)]
    pub hour_cycle: HourCycle,

    pub download_dir: Option<String>,
}

/// Get the config file path (~/.config/icsdrop/config.toml)
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("icsdrop");
    Ok(config_dir.join("config.toml"))
}

/// Load the config file.
///
/// An explicitly given path must exist; a missing default file means defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (config_path()?, false),
    };

    if !path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", path.display());
        }
        log::debug!("No config file at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn parse_config(contents: &str) -> Result<Config> {
    Ok(toml::from_str(contents)?)
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Default)]
pub struct Overrides {
    pub feed: Option<String>,
    pub timezone: Option<String>,
    pub h12: bool,
}

/// Effective settings after merging config file and command line
#[derive(Debug)]
pub struct Settings {
    pub feed: Option<String>,
    pub format: FormatOptions,
    pub download_dir: PathBuf,
}

impl Settings {
    pub fn resolve(config: Config, overrides: Overrides) -> Result<Self> {
        let zone = match overrides.timezone.or(config.timezone) {
            Some(name) => name.parse::<Zone>()?,
            None => Zone::Local,
        };
        let hour_cycle = if overrides.h12 {
            HourCycle::H12
        } else {
            config.hour_cycle
        };

        let download_dir = match config.download_dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(&dir).as_ref()),
            None => default_download_dir(),
        };

        Ok(Settings {
            feed: overrides.feed.or(config.feed),
            format: FormatOptions { zone, hour_cycle },
            download_dir,
        })
    }

    pub fn feed(&self) -> Result<&str> {
        self.feed.as_deref().context(
            "No feed configured.\n\n\
            Pass one with:\n  \
            icsdrop --feed https://example.com/calendar.ics list\n\n\
            or set `feed = \"...\"` in the config file",
        )
    }
}

/// The OS download directory, or the current directory if there is none.
fn default_download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

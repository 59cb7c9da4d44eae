// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! Provides [`BootConfig`], the configuration file for the boot switcher.
//!
//! This parses space separated key value pairs, the format of which is defined in
//! the [`BootConfig`] struct.
//!
//! Example configuration:
//!
//! ```text
//! # The firmware tool and the elevation program
//! efibootmgr /usr/bin/efibootmgr
//! sudo sudo
//!
//! # The command that reboots the machine
//! reboot systemctl reboot
//!
//! # Seconds before a privileged command is abandoned
//! exec_timeout 30
//!
//! # Logging, which is held in memory and printed on exit if there is no log file
//! log_level info
//! log_file /var/log/bootswitch.log
//!
//! # Change the colors of the application
//! background black
//! foreground white
//! highlight_background cyan
//! highlight_foreground black
//! ```

use std::{
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use log::{LevelFilter, warn};

/// The hardcoded configuration path for the [`BootConfig`].
const CONFIG_PATH: &str = "/etc/bootswitch.conf";

/// The default amount of seconds a privileged command may run for.
const DEFAULT_EXEC_TIMEOUT: u64 = 30;

/// A color of the frontend.
///
/// This is kept independent of any terminal library, the frontend maps it to its own color type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    /// Black.
    Black,
    /// Red.
    Red,
    /// Green.
    Green,
    /// Yellow.
    Yellow,
    /// Blue.
    Blue,
    /// Magenta.
    Magenta,
    /// Cyan.
    Cyan,
    /// Light gray.
    Gray,
    /// Dark gray.
    DarkGray,
    /// Light red.
    LightRed,
    /// Light green.
    LightGreen,
    /// Light yellow.
    LightYellow,
    /// Light blue.
    LightBlue,
    /// Light magenta.
    LightMagenta,
    /// Light cyan.
    LightCyan,
    /// White.
    White,
}

impl FromStr for Color {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match &*s.to_ascii_lowercase() {
            "black" => Self::Black,
            "red" => Self::Red,
            "green" => Self::Green,
            "yellow" => Self::Yellow,
            "blue" => Self::Blue,
            "magenta" => Self::Magenta,
            "cyan" => Self::Cyan,
            "gray" => Self::Gray,
            "dark_gray" => Self::DarkGray,
            "light_red" => Self::LightRed,
            "light_green" => Self::LightGreen,
            "light_yellow" => Self::LightYellow,
            "light_blue" => Self::LightBlue,
            "light_magenta" => Self::LightMagenta,
            "light_cyan" => Self::LightCyan,
            "white" => Self::White,
            _ => return Err(()),
        })
    }
}

/// The configuration file for the boot switcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootConfig {
    /// The firmware tool that lists and modifies the boot table.
    pub efibootmgr: String,

    /// The elevation program.
    pub sudo: String,

    /// The command that reboots the machine, and its arguments.
    pub reboot: Vec<String>,

    /// How long a privileged command may run before it is killed.
    pub exec_timeout: Duration,

    /// The maximum level of log records.
    pub log_level: LevelFilter,

    /// The file log records are appended to. If [`None`], records are held in memory.
    pub log_file: Option<PathBuf>,

    /// Allows adjusting the background of the UI.
    pub bg: Color,

    /// Allows adjusting the foreground of the UI.
    pub fg: Color,

    /// Allows adjusting the background of the highlighter.
    pub highlight_bg: Color,

    /// Allows adjusting the foreground of the highlighter.
    pub highlight_fg: Color,
}

impl BootConfig {
    /// Creates a new [`BootConfig`] from the hardcoded configuration path.
    ///
    /// A missing or unreadable file results in the default [`BootConfig`].
    #[must_use = "Has no effect if the result is unused"]
    pub fn new() -> Self {
        Self::from_path(Path::new(CONFIG_PATH))
    }

    /// Creates a new [`BootConfig`] from a file.
    ///
    /// A missing or unreadable file results in the default [`BootConfig`].
    #[must_use = "Has no effect if the result is unused"]
    pub fn from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::get_boot_config(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                warn!("Could not read {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Parses the contents of a [`BootConfig`] format string.
    #[must_use = "Has no effect if the result is unused"]
    pub fn get_boot_config(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once(char::is_whitespace) else {
                warn!("Ignoring config line without a value: {line}");
                continue;
            };
            let value = value.trim();

            match &*key.to_ascii_lowercase() {
                "efibootmgr" => config.efibootmgr = value.to_owned(),
                "sudo" => config.sudo = value.to_owned(),
                "reboot" => config.reboot = value.split_whitespace().map(str::to_owned).collect(),
                "exec_timeout" => match value.parse() {
                    Ok(secs) if secs > 0 => config.exec_timeout = Duration::from_secs(secs),
                    _ => warn!("Ignoring invalid exec_timeout: {value}"),
                },
                "log_level" => match value.parse() {
                    Ok(level) => config.log_level = level,
                    Err(_) => warn!("Ignoring invalid log_level: {value}"),
                },
                "log_file" => config.log_file = Some(PathBuf::from(value)),
                "background" => set_color(&mut config.bg, value),
                "foreground" => set_color(&mut config.fg, value),
                "highlight_background" => set_color(&mut config.highlight_bg, value),
                "highlight_foreground" => set_color(&mut config.highlight_fg, value),
                _ => warn!("Ignoring unknown config key: {key}"),
            }
        }

        config
    }
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            efibootmgr: "efibootmgr".to_owned(),
            sudo: "sudo".to_owned(),
            reboot: vec!["systemctl".to_owned(), "reboot".to_owned()],
            exec_timeout: Duration::from_secs(DEFAULT_EXEC_TIMEOUT),
            log_level: LevelFilter::Warn,
            log_file: None,
            bg: Color::Black,
            fg: Color::White,
            highlight_bg: Color::Cyan,
            highlight_fg: Color::Black,
        }
    }
}

/// Replaces a color if the value names one.
fn set_color(color: &mut Color, value: &str) {
    match value.parse() {
        Ok(parsed) => *color = parsed,
        Err(()) => warn!("Ignoring unknown color: {value}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config() {
        let config = r"
            # comment
            efibootmgr /usr/sbin/efibootmgr
            sudo doas
            reboot loginctl reboot --now
            exec_timeout 10
            log_level debug
            log_file /tmp/bootswitch.log
            background gray
            foreground light_yellow
            highlight_background black
            highlight_foreground white
        ";

        let config = BootConfig::get_boot_config(config);
        assert_eq!(config.efibootmgr, "/usr/sbin/efibootmgr");
        assert_eq!(config.sudo, "doas");
        assert_eq!(config.reboot, ["loginctl", "reboot", "--now"]);
        assert_eq!(config.exec_timeout, Duration::from_secs(10));
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(
            config.log_file.as_deref(),
            Some(Path::new("/tmp/bootswitch.log"))
        );
        assert_eq!(config.bg, Color::Gray);
        assert_eq!(config.fg, Color::LightYellow);
        assert_eq!(config.highlight_bg, Color::Black);
        assert_eq!(config.highlight_fg, Color::White);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = "exec_timeout soon\nexec_timeout 0\nlog_level loud\nforeground plaid\nunknown_key 1\nsudo\n";
        assert_eq!(BootConfig::get_boot_config(config), BootConfig::default());
    }

    #[test]
    fn test_missing_file() {
        let config = BootConfig::from_path(Path::new("/nonexistent/bootswitch.conf"));
        assert_eq!(config, BootConfig::default());
    }
}

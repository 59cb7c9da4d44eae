// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! Provides [`Theme`], which exposes the color scheme for the UI.

use bootswitch_core::boot::config::{BootConfig, Color as ConfigColor};
use ratatui_core::style::{Color as RatatuiColor, Modifier, Style};

/// The color scheme of the UI.
#[derive(Clone, Copy, Default)]
pub struct Theme {
    /// The color scheme for everything except highlighted items.
    pub base: Style,

    /// The color scheme for highlighted items.
    pub highlight: Style,

    /// The color scheme for error messages.
    pub error: Style,
}

impl Theme {
    /// Create a new [`Theme`] from a [`BootConfig`].
    #[must_use = "Has no effect if the result is unused"]
    pub const fn new(config: &BootConfig) -> Self {
        let bg = to_ratatui_color(config.bg);
        Self {
            base: Style::new().fg(to_ratatui_color(config.fg)).bg(bg),
            highlight: Style::new()
                .fg(to_ratatui_color(config.highlight_fg))
                .bg(to_ratatui_color(config.highlight_bg)),
            error: Style::new()
                .fg(RatatuiColor::LightRed)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        }
    }
}

/// Convert configured colors [`ConfigColor`] to ANSI colors [`RatatuiColor`].
const fn to_ratatui_color(color: ConfigColor) -> RatatuiColor {
    match color {
        ConfigColor::Black => RatatuiColor::Black,
        ConfigColor::Red => RatatuiColor::Red,
        ConfigColor::Green => RatatuiColor::Green,
        ConfigColor::Yellow => RatatuiColor::Yellow,
        ConfigColor::Blue => RatatuiColor::Blue,
        ConfigColor::Magenta => RatatuiColor::Magenta,
        ConfigColor::Cyan => RatatuiColor::Cyan,
        ConfigColor::Gray => RatatuiColor::Gray,
        ConfigColor::DarkGray => RatatuiColor::DarkGray,
        ConfigColor::LightRed => RatatuiColor::LightRed,
        ConfigColor::LightGreen => RatatuiColor::LightGreen,
        ConfigColor::LightYellow => RatatuiColor::LightYellow,
        ConfigColor::LightBlue => RatatuiColor::LightBlue,
        ConfigColor::LightMagenta => RatatuiColor::LightMagenta,
        ConfigColor::LightCyan => RatatuiColor::LightCyan,
        ConfigColor::White => RatatuiColor::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_from_config() {
        let config = BootConfig::get_boot_config("foreground light_yellow\nhighlight_background magenta\n");
        let theme = Theme::new(&config);
        assert_eq!(theme.base.fg, Some(RatatuiColor::LightYellow));
        assert_eq!(theme.base.bg, Some(RatatuiColor::Black));
        assert_eq!(theme.highlight.bg, Some(RatatuiColor::Magenta));
        assert_eq!(theme.error.bg, theme.base.bg);
    }
}

// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! App widget implementation.

use ratatui_core::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    widgets::Widget,
};

use crate::app::App;

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // header on top, then the panels, then one line each for the status and the help
        let [header, panels, status, help] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let [priority, once] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(panels);

        self.render_header(header, buf);
        self.render_priority(priority, buf);
        self.render_once(once, buf);
        self.render_status(status, buf);
        self.render_help(help, buf);
        self.render_popup(area, buf);
    }
}

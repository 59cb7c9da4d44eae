// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! The user interface of the boot switcher.
//!
//! The screen is split into two panels side by side: "Boot Priority" shows the pending boot order, and "Boot Once"
//! shows the entries that can be picked for the next boot only. Prompts and the reboot countdown are drawn as popups
//! on top of the panels.
//!
//! The theme of the UI can be changed through the config file. There is support for changing the color,
//! and the highlight color.

use ratatui_core::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::Style,
    text::{Line, Span, Text},
    widgets::{StatefulWidget, Widget},
};
use ratatui_widgets::{
    block::Block,
    borders::Borders,
    clear::Clear,
    list::{List, ListItem},
    paragraph::{Paragraph, Wrap},
};
use tinyvec::ArrayVec;

use crate::{
    MainError,
    app::{App, Panel, Prompt},
    ui::{backend::Tui, boot_list::BootList, theme::Theme},
};

mod widget;

pub mod backend;
pub mod boot_list;
pub mod theme;

/// The character shown in place of each character of a hidden password.
const MASK: char = '•';

impl App {
    /// Draw a frame to the screen.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the widgets could not be drawn to the screen.
    pub fn draw(&mut self, terminal: &mut Tui) -> Result<(), MainError> {
        terminal.draw(|f| f.render_widget(self, f.area()))?;
        Ok(())
    }

    /// Renders the name of the program, as well as the version number.
    pub fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let header_block = Block::default()
            .borders(Borders::ALL)
            .style(self.theme.base);
        let header = Paragraph::new(Text::styled(
            concat!("bootswitch ", env!("CARGO_PKG_VERSION")),
            self.theme.base,
        ))
        .alignment(Alignment::Center)
        .block(header_block);

        Widget::render(header, area, buf);
    }

    /// Renders the "Boot Priority" panel.
    pub fn render_priority(&mut self, area: Rect, buf: &mut Buffer) {
        let title = if self.boot_mgr.has_pending_changes() {
            " Boot Priority (unsaved) "
        } else {
            " Boot Priority "
        };
        let focused = self.panel == Panel::Priority;
        render_list(&mut self.priority, self.theme, title, focused, area, buf);
    }

    /// Renders the "Boot Once" panel.
    pub fn render_once(&mut self, area: Rect, buf: &mut Buffer) {
        let focused = self.panel == Panel::Once;
        render_list(&mut self.once, self.theme, " Boot Once ", focused, area, buf);
    }

    /// Renders the status line, which shows a running job or the last message.
    pub fn render_status(&self, area: Rect, buf: &mut Buffer) {
        let line = if let Some(purpose) = self.running_job() {
            Line::styled(format!("{purpose}, waiting for {}...", self.boot_mgr.config.sudo), self.theme.base)
        } else if let Some(status) = &self.status {
            let style = if status.error {
                self.theme.error
            } else {
                self.theme.base
            };
            Line::styled(status.text.as_str(), style)
        } else {
            Line::raw(" ").style(self.theme.base)
        };

        Widget::render(line.alignment(Alignment::Center), area, buf);
    }

    /// Renders the help bar at the bottom of the screen.
    pub fn render_help(&self, area: Rect, buf: &mut Buffer) {
        const COMMON: [(&str, &str); 4] = [
            (" ↑/K ", " Up "),
            (" ↓/J ", " Down "),
            (" Tab ", " Switch Panel "),
            (" Q ", " Exit "),
        ];
        const PRIORITY: [(&str, &str); 4] = [
            (" U/D ", " Move "),
            (" Return ", " Save "),
            (" R ", " Reload "),
            (" X ", " Clear Once "),
        ];
        const ONCE: [(&str, &str); 3] = [
            (" Return ", " Boot Once "),
            (" R ", " Reload "),
            (" X ", " Clear Once "),
        ];

        let panel_keys: &[_] = match self.panel {
            Panel::Priority => &PRIORITY,
            Panel::Once => &ONCE,
        };

        let mut spans: ArrayVec<[_; 16]> = ArrayVec::new();

        for (key, desc) in COMMON.iter().chain(panel_keys) {
            spans.push(Span::styled(*key, self.theme.highlight));
            spans.push(Span::styled(*desc, self.theme.base));
        }

        Line::default()
            .spans(spans)
            .centered()
            .style(Style::default())
            .render(area, buf);
    }

    /// Renders the popup of the countdown or of an open prompt, if there is one.
    pub fn render_popup(&self, area: Rect, buf: &mut Buffer) {
        if let Some(remaining) = self.countdown.remaining() {
            let text = Text::from(vec![
                Line::raw(format!("Rebooting in {remaining} seconds")),
                Line::raw(""),
                Line::from(vec![
                    Span::styled(" Esc/C ", self.theme.highlight),
                    Span::raw(" Cancel "),
                ]),
            ]);
            render_popup(" Reboot ", text, self.theme, area, buf);
            return;
        }

        match &self.prompt {
            Some(Prompt::Password {
                purpose,
                password,
                visible,
            }) => {
                // borrowed, so that no copy of the password is left behind on the heap
                let shown = if *visible {
                    Span::styled(password.expose(), self.theme.highlight)
                } else {
                    Span::styled(MASK.to_string().repeat(password.len()), self.theme.highlight)
                };
                let text = Text::from(vec![
                    Line::raw(format!("{purpose}: enter the password for {}", self.boot_mgr.config.sudo)),
                    Line::raw(""),
                    Line::from(vec![Span::raw("> "), shown]),
                    Line::raw(""),
                    Line::from(vec![
                        Span::styled(" Return ", self.theme.highlight),
                        Span::raw(" Confirm "),
                        Span::styled(" Tab ", self.theme.highlight),
                        Span::raw(if *visible { " Hide " } else { " Show " }),
                        Span::styled(" Esc ", self.theme.highlight),
                        Span::raw(" Cancel "),
                    ]),
                ]);
                render_popup(" Password ", text, self.theme, area, buf);
            }
            Some(Prompt::ConfirmReboot) => {
                let text = Text::from(vec![
                    Line::raw("The boot order was saved. Reboot now?"),
                    Line::raw(""),
                    Line::from(vec![
                        Span::styled(" Y ", self.theme.highlight),
                        Span::raw(" Reboot "),
                        Span::styled(" N ", self.theme.highlight),
                        Span::raw(" Later "),
                    ]),
                ]);
                render_popup(" Reboot ", text, self.theme, area, buf);
            }
            None => (),
        }
    }
}

/// Renders a [`BootList`] inside a bordered panel. The focused panel gets a highlighted border.
fn render_list(
    boot_list: &mut BootList,
    theme: Theme,
    title: &str,
    focused: bool,
    area: Rect,
    buf: &mut Buffer,
) {
    let border = if focused { theme.highlight } else { theme.base };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title)
        .style(theme.base);

    if boot_list.items.is_empty() {
        let empty = Paragraph::new("No boot entries")
            .alignment(Alignment::Center)
            .block(block);
        Widget::render(empty, area, buf);
        return;
    }

    let highlight = if focused { theme.highlight } else { theme.base };
    let list = List::new(boot_list.items.iter().map(|x| ListItem::new(&**x)))
        .block(block)
        .style(theme.base)
        .highlight_style(highlight)
        .highlight_symbol(" → ");

    StatefulWidget::render(list, area, buf, &mut boot_list.state);
}

/// Renders a bordered popup in the middle of an area.
fn render_popup(title: &str, text: Text<'_>, theme: Theme, area: Rect, buf: &mut Buffer) {
    let height = u16::try_from(text.height()).unwrap_or(u16::MAX).saturating_add(2);
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Percentage(60)])
        .flex(Flex::Center)
        .areas(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.highlight)
        .title(title)
        .style(theme.base);
    let popup = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .block(block);

    Widget::render(Clear, area, buf);
    Widget::render(popup, area, buf);
}

// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! Key handling for the [`App`].

use std::{io, time::Duration};

use bootswitch_core::{boot::order::Direction, system::secret::Password};
use ratatui_crossterm::crossterm::event::{self, Event, KeyCode, KeyEventKind};

use crate::app::{App, AppState, Panel, Prompt, Purpose};

/// How long to wait for input before the loop moves on.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

impl App {
    /// Waits a short while for input, then handles every key that arrived.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the terminal could not be read from.
    pub(super) fn handle_events(&mut self) -> io::Result<()> {
        if !event::poll(POLL_INTERVAL)? {
            return Ok(());
        }

        loop {
            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key.code);
            }

            if !event::poll(Duration::ZERO)? {
                return Ok(());
            }
        }
    }

    /// Handle a key.
    ///
    /// The countdown takes precedence over everything else, then an open prompt, then the panels.
    pub fn handle_key(&mut self, key: KeyCode) {
        if self.countdown.is_counting() {
            self.handle_countdown_key(key);
            return;
        }

        match self.prompt.take() {
            Some(Prompt::Password {
                purpose,
                password,
                visible,
            }) => self.handle_password_key(key, purpose, password, visible),
            Some(Prompt::ConfirmReboot) => self.handle_confirm_key(key),
            None if self.job.is_some() => (), // wait for the job
            None => self.handle_panel_key(key),
        }
    }

    /// Handle a key while the countdown runs. Only cancelling is possible.
    fn handle_countdown_key(&mut self, key: KeyCode) {
        if matches!(
            key,
            KeyCode::Esc | KeyCode::Char('c' | 'C' | 'n' | 'N' | 'q' | 'Q')
        ) && self.countdown.cancel()
        {
            self.set_status("Reboot cancelled");
        }
    }

    /// Handle a key in the password prompt.
    ///
    /// Return submits the password, escape cancels, tab shows or hides the password.
    fn handle_password_key(
        &mut self,
        key: KeyCode,
        purpose: Purpose,
        mut password: Password,
        mut visible: bool,
    ) {
        match key {
            KeyCode::Enter => {
                self.submit(purpose, password);
                return;
            }
            KeyCode::Esc => {
                self.set_status("Cancelled");
                return;
            }
            KeyCode::Tab => visible = !visible,
            KeyCode::Backspace => {
                password.pop();
            }
            KeyCode::Char(c) => {
                if !password.push(c) {
                    self.set_error("Password is too long");
                }
            }
            _ => (),
        }

        self.prompt = Some(Prompt::Password {
            purpose,
            password,
            visible,
        });
    }

    /// Handle a key in the reboot confirmation. Confirming asks for the password again.
    fn handle_confirm_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter | KeyCode::Char('y' | 'Y') => self.ask_password(Purpose::Reboot),
            KeyCode::Esc | KeyCode::Char('n' | 'N' | 'q' | 'Q') => {
                self.set_status("Changes apply on the next reboot");
            }
            _ => self.prompt = Some(Prompt::ConfirmReboot),
        }
    }

    /// Handle a key in either panel.
    fn handle_panel_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Tab | KeyCode::BackTab => self.panel = self.panel.toggle(),
            KeyCode::Up => self.focused_list().select_previous(),
            KeyCode::Down => self.focused_list().select_next(),
            KeyCode::Enter => self.confirm_selection(),
            KeyCode::Esc => self.state = AppState::Exiting,
            KeyCode::Char(c) => self.handle_printable_key(c.to_ascii_lowercase()),
            _ => (),
        }
    }

    /// Handle a printable key in either panel.
    ///
    /// This includes k/j for alternate selection, u/d for moving entries, x for clearing the one-time boot, r for
    /// reloading, and q for exiting.
    fn handle_printable_key(&mut self, key: char) {
        match key {
            'k' => self.focused_list().select_previous(),
            'j' => self.focused_list().select_next(),
            'u' => self.move_selected(Direction::Up),
            'd' => self.move_selected(Direction::Down),
            'x' => {
                if self.boot_mgr.table().boot_next().is_some() {
                    self.ask_password(Purpose::ClearNext);
                } else {
                    self.set_status("No one-time boot is set");
                }
            }
            'r' => self.reload(),
            'q' => self.state = AppState::Exiting,
            _ => (),
        }
    }

    /// Applies the order, or picks the one-time boot target, depending on the panel.
    fn confirm_selection(&mut self) {
        match self.panel {
            Panel::Priority => {
                if self.boot_mgr.has_pending_changes() {
                    self.ask_password(Purpose::ApplyOrder);
                } else {
                    self.set_status("The boot order is unchanged");
                }
            }
            Panel::Once => {
                if let Some(id) = self.once.selected_id() {
                    self.ask_password(Purpose::SetNext(id));
                }
            }
        }
    }

    /// Moves the selected entry of the priority panel, keeping it selected.
    fn move_selected(&mut self, direction: Direction) {
        if self.panel != Panel::Priority {
            return;
        }
        let Some(id) = self.priority.selected_id() else {
            return;
        };

        match self.boot_mgr.move_entry(id, direction) {
            Ok(()) => {
                self.rebuild_lists();
                self.priority.select_id(id);
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    /// Reads the table again, discarding the pending edits.
    fn reload(&mut self) {
        match self.boot_mgr.reload() {
            Ok(()) => {
                self.rebuild_lists();
                self.set_status("Boot table reloaded");
            }
            Err(e) => self.set_error(format!("Could not reload: {e}")),
        }
    }

    /// Opens the password prompt.
    pub(super) fn ask_password(&mut self, purpose: Purpose) {
        self.prompt = Some(Prompt::Password {
            purpose,
            password: Password::new(),
            visible: false,
        });
    }

    /// Returns the list of the focused panel.
    const fn focused_list(&mut self) -> &mut crate::ui::boot_list::BootList {
        match self.panel {
            Panel::Priority => &mut self.priority,
            Panel::Once => &mut self.once,
        }
    }
}

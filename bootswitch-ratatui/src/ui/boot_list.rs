// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! Provides [`BootList`], which is a way to display [`BootEntry`]s using ratatui.
//!
//! It may be constructed from an iterator of ids and titles, or from a [`BootMgr`] for either of the two panels.

use bootswitch_core::{
    boot::BootMgr,
    table::{BootEntry, types::BootId},
};
use ratatui_widgets::list::ListState;

/// The UI frontend for a list of [`BootEntry`]s.
#[derive(Default)]
pub struct BootList {
    /// The ids of the entries, in display order.
    pub ids: Vec<BootId>,

    /// The titles of the entries, in display order.
    pub items: Vec<String>,

    /// The internal state of the list.
    pub state: ListState,
}

impl FromIterator<(BootId, String)> for BootList {
    fn from_iter<I: IntoIterator<Item = (BootId, String)>>(iter: I) -> Self {
        let (ids, items): (Vec<_>, Vec<_>) = iter.into_iter().unzip();
        let mut state = ListState::default();
        if !ids.is_empty() {
            state.select(Some(0));
        }
        Self { ids, items, state }
    }
}

impl BootList {
    /// Creates the list of the "Boot Priority" panel, which is the pending order.
    #[must_use = "Has no effect if the result is unused"]
    pub fn priority(boot_mgr: &BootMgr) -> Self {
        let default = boot_mgr.table().current_default().map(|entry| entry.id);
        boot_mgr
            .entries_in_pending_order()
            .map(|entry| {
                let mut title = choose_title(entry);
                if !entry.active {
                    title.push_str(" (inactive)");
                }
                if Some(entry.id) == default {
                    title.push_str(" (default)");
                }
                (entry.id, title)
            })
            .collect()
    }

    /// Creates the list of the "Boot Once" panel.
    #[must_use = "Has no effect if the result is unused"]
    pub fn once(boot_mgr: &BootMgr) -> Self {
        let table = boot_mgr.table();
        boot_mgr
            .entries_in_pending_order()
            .map(|entry| {
                let mut title = choose_title(entry);
                if Some(entry.id) == table.boot_current() {
                    title.push_str(" (running)");
                }
                if Some(entry.id) == table.boot_next() {
                    title.push_str(" (next boot)");
                }
                (entry.id, title)
            })
            .collect()
    }

    /// Returns the [`BootId`] of the selected entry.
    #[must_use = "Has no effect if the result is unused"]
    pub fn selected_id(&self) -> Option<BootId> {
        self.state.selected().and_then(|i| self.ids.get(i)).copied()
    }

    /// Selects the entry with a given [`BootId`], if it is in the list.
    pub fn select_id(&mut self, id: BootId) {
        if let Some(i) = self.ids.iter().position(|&x| x == id) {
            self.state.select(Some(i));
        }
    }

    /// Moves the selection up by one, stopping at the first entry.
    pub fn select_previous(&mut self) {
        if let Some(i) = self.state.selected() {
            self.state.select(Some(i.saturating_sub(1)));
        }
    }

    /// Moves the selection down by one, stopping at the last entry.
    pub fn select_next(&mut self) {
        if let Some(i) = self.state.selected() {
            let last = self.ids.len().saturating_sub(1);
            self.state.select(Some((i + 1).min(last)));
        }
    }

    /// Replaces the entries of the list, keeping the selection on the same [`BootId`] where possible.
    pub fn replace(&mut self, new: Self) {
        let selected = self.selected_id();
        let index = self.state.selected();
        *self = new;

        if let Some(id) = selected
            && self.ids.contains(&id)
        {
            self.select_id(id);
        } else if let Some(i) = index
            && !self.ids.is_empty()
        {
            self.state.select(Some(i.min(self.ids.len() - 1)));
        }
    }
}

/// Picks a title for a [`BootEntry`].
///
/// The label is preferred. Firmware may register entries with an empty label, in which case the name of the
/// variable is used.
fn choose_title(entry: &BootEntry) -> String {
    if entry.label.is_empty() {
        format!("Boot{}", entry.id)
    } else {
        format!("{}  {}", entry.id, entry.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(ids: &[u16]) -> BootList {
        ids.iter()
            .map(|&id| (BootId::new(id), format!("Entry {id}")))
            .collect()
    }

    #[test]
    fn test_selection_is_clamped() {
        let mut list = list(&[1, 2, 3]);
        assert_eq!(list.selected_id(), Some(BootId::new(1)));

        list.select_previous();
        assert_eq!(list.selected_id(), Some(BootId::new(1)));

        for _ in 0..5 {
            list.select_next();
        }
        assert_eq!(list.selected_id(), Some(BootId::new(3)));
    }

    #[test]
    fn test_replace_follows_id() {
        let mut old = list(&[1, 2, 3]);
        old.select_id(BootId::new(2));

        old.replace(list(&[3, 2, 1]));
        assert_eq!(old.state.selected(), Some(1));

        old.select_id(BootId::new(1));
        old.replace(list(&[3, 2]));
        assert_eq!(old.selected_id(), Some(BootId::new(2)));
    }

    #[test]
    fn test_empty_list() {
        let mut list = list(&[]);
        list.select_next();
        assert_eq!(list.selected_id(), None);
    }
}

// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! Provides [`BootTable`], the in-memory model of the firmware boot table.
//!
//! A [`BootTable`] is only ever built by parsing the listing that `efibootmgr -v` prints, and it is never mutated
//! afterwards. After anything is written to the firmware, the table is parsed again, so that it can never drift from
//! what the firmware actually holds.

use std::{collections::BTreeMap, fmt};

use crate::table::{
    parser::ParseError,
    types::{BootId, BootOrder},
};

pub mod parser;
pub mod types;

/// One firmware boot option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootEntry {
    /// The firmware index of the entry.
    pub id: BootId,

    /// The human readable name of the entry.
    pub label: String,

    /// The device path of the entry as printed by the firmware tool. This is never interpreted.
    pub device_path: String,

    /// Whether the firmware considers this entry during a normal boot.
    pub active: bool,
}

/// The firmware boot table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootTable {
    /// Every boot entry, keyed by its index.
    entries: BTreeMap<BootId, BootEntry>,

    /// The persistent boot order. Always a permutation of the keys of `entries`.
    order: BootOrder,

    /// The one-time boot target, if one is set.
    boot_next: Option<BootId>,

    /// The entry that the running system was booted from.
    boot_current: Option<BootId>,

    /// The firmware boot menu timeout in seconds.
    timeout: Option<u16>,
}

impl BootTable {
    /// Parses the verbose listing of the firmware tool into a [`BootTable`].
    ///
    /// # Errors
    ///
    /// May return an `Error` if the listing is malformed. See [`ParseError`] for the cases.
    pub fn parse(listing: &str) -> Result<Self, ParseError> {
        parser::parse_listing(listing)
    }

    /// Returns a reference to the inner map of [`BootEntry`]s.
    #[must_use = "Has no effect if the result is unused"]
    pub const fn entries(&self) -> &BTreeMap<BootId, BootEntry> {
        &self.entries
    }

    /// Returns the [`BootEntry`] of a given [`BootId`], if it exists.
    #[must_use = "Has no effect if the result is unused"]
    pub fn entry(&self, id: BootId) -> Option<&BootEntry> {
        self.entries.get(&id)
    }

    /// Checks if the table has an entry with the given [`BootId`].
    #[must_use = "Has no effect if the result is unused"]
    pub fn contains(&self, id: BootId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Returns the persistent [`BootOrder`].
    #[must_use = "Has no effect if the result is unused"]
    pub const fn order(&self) -> &BootOrder {
        &self.order
    }

    /// Returns the one-time boot target, if any.
    #[must_use = "Has no effect if the result is unused"]
    pub const fn boot_next(&self) -> Option<BootId> {
        self.boot_next
    }

    /// Returns the entry the running system was booted from, if the firmware reported it.
    #[must_use = "Has no effect if the result is unused"]
    pub const fn boot_current(&self) -> Option<BootId> {
        self.boot_current
    }

    /// Returns the firmware menu timeout in seconds, if the firmware reported it.
    #[must_use = "Has no effect if the result is unused"]
    pub const fn timeout(&self) -> Option<u16> {
        self.timeout
    }

    /// Gets the default boot entry, which is the first active entry in the persistent order.
    #[must_use = "Has no effect if the result is unused"]
    pub fn current_default(&self) -> Option<&BootEntry> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .find(|entry| entry.active)
    }

    /// Returns an iterator over the [`BootEntry`]s in the sequence of some order.
    ///
    /// Ids that are not in the table are skipped.
    pub fn entries_in<'a>(&'a self, order: &'a BootOrder) -> impl Iterator<Item = &'a BootEntry> {
        order.iter().filter_map(|id| self.entries.get(id))
    }
}

impl fmt::Display for BootTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(current) = self.boot_current {
            writeln!(f, "BootCurrent: {current}")?;
        }
        if let Some(timeout) = self.timeout {
            writeln!(f, "Timeout: {timeout} seconds")?;
        }
        if let Some(next) = self.boot_next {
            writeln!(f, "BootNext: {next}")?;
        }
        writeln!(f, "BootOrder: {}", self.order)?;
        for entry in self.entries.values() {
            let marker = if entry.active { '*' } else { ' ' };
            write!(f, "Boot{}{marker} {}", entry.id, entry.label)?;
            if !entry.device_path.is_empty() {
                write!(f, "\t{}", entry.device_path)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Builders used by the firmware double in tests.
#[cfg(test)]
impl BootTable {
    /// Returns a copy of the table with a different persistent order.
    pub(crate) fn with_order(&self, order: BootOrder) -> Self {
        Self {
            order,
            ..self.clone()
        }
    }

    /// Returns a copy of the table with a different one-time boot target.
    pub(crate) fn with_boot_next(&self, boot_next: Option<BootId>) -> Self {
        Self {
            boot_next,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "BootCurrent: 0001
Timeout: 1 seconds
BootOrder: 0002,0001,0003
Boot0001* Fedora\tHD(1,GPT,0d2d1c2a-0000-4c2b-8f7b-4a4b6b8b2e11,0x800,0x12c000)/File(\\EFI\\fedora\\shimx64.efi)
Boot0002* Windows Boot Manager\tHD(1,GPT,0d2d1c2a-0000-4c2b-8f7b-4a4b6b8b2e11,0x800,0x12c000)/File(\\EFI\\Microsoft\\Boot\\bootmgfw.efi)
Boot0003  UEFI Shell\tFvVol(7cb8bdc9-f8eb-4f34-aaea-3ee4af6516a1)/FvFile(7c04a583-9e3e-4f1c-ad65-e05268d0b4d1)
";

    #[test]
    fn test_current_default() {
        let table = BootTable::parse(LISTING).expect("listing in test should parse");
        let default = table.current_default().map(|entry| entry.id);
        assert_eq!(default, Some(BootId::new(2)));
    }

    #[test]
    fn test_current_default_skips_inactive() {
        let listing = "BootOrder: 0003,0001\nBoot0001* A\nBoot0003  B\n";
        let table = BootTable::parse(listing).expect("listing in test should parse");
        assert_eq!(
            table.current_default().map(|entry| &*entry.label),
            Some("A")
        );
    }

    #[test]
    fn test_display_parses_back() {
        let table = BootTable::parse(LISTING).expect("listing in test should parse");
        let reparsed = BootTable::parse(&table.to_string()).expect("rendered table should parse");
        assert_eq!(table, reparsed);
    }

    #[test]
    fn test_entries_in() {
        let table = BootTable::parse(LISTING).expect("listing in test should parse");
        let labels: Vec<_> = table
            .entries_in(table.order())
            .map(|entry| entry.label.as_str())
            .collect();
        assert_eq!(labels, ["Windows Boot Manager", "Fedora", "UEFI Shell"]);
    }
}

// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! A parser for the verbose listing of `efibootmgr`.
//!
//! Example listing:
//!
//! ```text
//! BootCurrent: 0001
//! Timeout: 1 seconds
//! BootNext: 0003
//! BootOrder: 0001,0002,0003
//! Boot0001* Fedora	HD(1,GPT,0d2d1c2a-...,0x800,0x12c000)/File(\EFI\fedora\shimx64.efi)
//! Boot0002* Windows Boot Manager	HD(1,GPT,0d2d1c2a-...,0x800,0x12c000)/File(\EFI\Microsoft\Boot\bootmgfw.efi)
//! Boot0003  UEFI Shell	FvVol(7cb8bdc9-...)/FvFile(7c04a583-...)
//! ```
//!
//! The exact whitespace differs between versions of the tool, so the label of an entry ends at the first tab, or,
//! if there is none, at the first word that looks like the start of a device path node. Anything that would change
//! what gets written back to the firmware (a missing or malformed identifier, a missing order, an order that refers
//! to entries that do not exist) is rejected instead of guessed.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};
use thiserror::Error;

use crate::table::{
    BootEntry, BootTable,
    types::{BootId, BootOrder},
};

/// The prefix of the persistent order line.
const ORDER_PREFIX: &str = "BootOrder:";

/// The prefix of the one-time boot line.
const NEXT_PREFIX: &str = "BootNext:";

/// The prefix of the current boot line.
const CURRENT_PREFIX: &str = "BootCurrent:";

/// The prefix of the firmware menu timeout line.
const TIMEOUT_PREFIX: &str = "Timeout:";

/// The prefix of a boot entry line.
const ENTRY_PREFIX: &str = "Boot";

/// The length of the identifier following [`ENTRY_PREFIX`].
const ID_LEN: usize = 4;

/// An `Error` that may result from parsing a listing.
///
/// Every variant that concerns a specific line keeps that line, so that it can be shown to the operator.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// A line did not contain a valid four digit hex identifier where one was required.
    #[error("No valid boot identifier in line \"{line}\"")]
    InvalidId {
        /// The offending line.
        line: String,
    },

    /// Two entry lines had the same identifier.
    #[error("Boot{id} is listed more than once (line \"{line}\")")]
    DuplicateEntry {
        /// The duplicated identifier.
        id: BootId,
        /// The second line with the identifier.
        line: String,
    },

    /// A summary line that may only appear once appeared again.
    #[error("Summary line appears more than once (line \"{line}\")")]
    DuplicateSummary {
        /// The repeated line.
        line: String,
    },

    /// The listing had no `BootOrder` line.
    #[error("The listing has no BootOrder line")]
    MissingOrder,

    /// The order referred to an entry that was not listed.
    #[error("BootOrder refers to unknown entry {id} (line \"{line}\")")]
    UnknownOrderId {
        /// The unknown identifier.
        id: BootId,
        /// The order line.
        line: String,
    },

    /// The order listed the same entry twice.
    #[error("BootOrder lists entry {id} more than once (line \"{line}\")")]
    DuplicateOrderId {
        /// The duplicated identifier.
        id: BootId,
        /// The order line.
        line: String,
    },

    /// The one-time boot target was not listed.
    #[error("BootNext refers to unknown entry {id} (line \"{line}\")")]
    UnknownBootNext {
        /// The unknown identifier.
        id: BootId,
        /// The one-time boot line.
        line: String,
    },
}

/// The state of a listing while it is being read line by line.
#[derive(Default)]
struct Listing {
    /// The entries read so far.
    entries: BTreeMap<BootId, BootEntry>,

    /// The order and the line it came from.
    order: Option<(Vec<BootId>, String)>,

    /// The one-time boot target and the line it came from.
    boot_next: Option<(BootId, String)>,

    /// The entry of the current boot.
    boot_current: Option<BootId>,

    /// The firmware menu timeout.
    timeout: Option<u16>,
}

impl Listing {
    /// Reads a single line of the listing into the [`Listing`].
    fn read_line(&mut self, line: &str) -> Result<(), ParseError> {
        if line.trim().is_empty() {
            return Ok(());
        }

        // continuation lines, such as the dp: and data: dumps of newer versions
        if line.starts_with(char::is_whitespace) {
            debug!("[LISTING PARSER]: Skipping continuation line {line}");
            return Ok(());
        }

        let line = line.trim_end();
        if let Some(value) = line.strip_prefix(ORDER_PREFIX) {
            if self.order.is_some() {
                return Err(duplicate_summary(line));
            }
            self.order = Some((parse_order(value, line)?, line.to_owned()));
        } else if let Some(value) = line.strip_prefix(NEXT_PREFIX) {
            if self.boot_next.is_some() {
                return Err(duplicate_summary(line));
            }
            let id = BootId::from_hex(value.trim()).map_err(|_| invalid_id(line))?;
            self.boot_next = Some((id, line.to_owned()));
        } else if let Some(value) = line.strip_prefix(CURRENT_PREFIX) {
            match BootId::from_hex(value.trim()) {
                Ok(id) => self.boot_current = Some(id),
                Err(e) => warn!("[LISTING PARSER]: Ignoring BootCurrent: {e}"),
            }
        } else if let Some(value) = line.strip_prefix(TIMEOUT_PREFIX) {
            let seconds = value.split_whitespace().next().map(str::parse);
            match seconds {
                Some(Ok(seconds)) => self.timeout = Some(seconds),
                _ => warn!("[LISTING PARSER]: Ignoring unparsable timeout in line {line}"),
            }
        } else if let Some(rest) = line.strip_prefix(ENTRY_PREFIX) {
            let entry = parse_entry(rest, line)?;
            if self.entries.contains_key(&entry.id) {
                return Err(ParseError::DuplicateEntry {
                    id: entry.id,
                    line: line.to_owned(),
                });
            }
            self.entries.insert(entry.id, entry);
        } else {
            debug!("[LISTING PARSER]: Skipping unrecognized line {line}");
        }

        Ok(())
    }

    /// Validates the [`Listing`] and turns it into a [`BootTable`].
    fn finish(self) -> Result<BootTable, ParseError> {
        let (mut order, line) = self.order.ok_or(ParseError::MissingOrder)?;

        let mut seen = BTreeSet::new();
        for &id in &order {
            if !self.entries.contains_key(&id) {
                return Err(ParseError::UnknownOrderId { id, line });
            }
            if !seen.insert(id) {
                return Err(ParseError::DuplicateOrderId { id, line });
            }
        }

        // entries that the firmware knows about but left out of the order go last, so that they are never dropped
        // when the order is written back.
        let unlisted: Vec<BootId> = self
            .entries
            .keys()
            .filter(|id| !seen.contains(id))
            .copied()
            .collect();
        if !unlisted.is_empty() {
            warn!(
                "[LISTING PARSER]: Entries {} are not in BootOrder, appending them",
                BootOrder::new(unlisted.clone())
            );
            order.extend(unlisted);
        }

        let boot_next = match self.boot_next {
            Some((id, line)) if !self.entries.contains_key(&id) => {
                return Err(ParseError::UnknownBootNext { id, line });
            }
            Some((id, _)) => Some(id),
            None => None,
        };

        Ok(BootTable {
            entries: self.entries,
            order: BootOrder::new(order),
            boot_next,
            boot_current: self.boot_current,
            timeout: self.timeout,
        })
    }
}

/// Parses a listing into a [`BootTable`]. No partial table is returned on failure.
pub(super) fn parse_listing(listing: &str) -> Result<BootTable, ParseError> {
    let mut state = Listing::default();
    for line in listing.lines() {
        state.read_line(line)?;
    }
    state.finish()
}

/// Parses the value of a `BootOrder` line.
///
/// An empty value is a valid, empty order. Empty items between commas are not.
fn parse_order(value: &str, line: &str) -> Result<Vec<BootId>, ParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(Vec::new());
    }

    value
        .split(',')
        .map(|id| BootId::from_hex(id.trim()).map_err(|_| invalid_id(line)))
        .collect()
}

/// Parses an entry line, given the line without its `Boot` prefix.
fn parse_entry(rest: &str, line: &str) -> Result<BootEntry, ParseError> {
    let (id, rest) = rest.split_at_checked(ID_LEN).ok_or_else(|| invalid_id(line))?;
    let id = BootId::from_hex(id).map_err(|_| invalid_id(line))?;

    let (active, rest) = match rest.chars().next() {
        Some('*') => (true, &rest[1..]),
        Some(c) if c.is_whitespace() => (false, rest),
        None => (false, rest),
        Some(_) => return Err(invalid_id(line)),
    };

    let (label, device_path) = split_label(rest);

    Ok(BootEntry {
        id,
        label: label.to_owned(),
        device_path: device_path.to_owned(),
        active,
    })
}

/// Splits the remainder of an entry line into its label and its device path.
fn split_label(rest: &str) -> (&str, &str) {
    if let Some((label, path)) = rest.split_once('\t') {
        return (label.trim(), path.trim());
    }

    match find_path_start(rest) {
        Some(start) => (rest[..start].trim(), rest[start..].trim()),
        None => (rest.trim(), ""),
    }
}

/// Finds the first word after the first that looks like a device path node, such as `HD(` or `PciRoot(`.
fn find_path_start(rest: &str) -> Option<usize> {
    let rest_trimmed = rest.trim_start();
    let offset = rest.len() - rest_trimmed.len();
    let bytes = rest_trimmed.as_bytes();

    rest_trimmed
        .char_indices()
        .filter(|&(i, c)| i > 0 && !c.is_whitespace() && bytes[i - 1].is_ascii_whitespace())
        .map(|(i, _)| i)
        .find(|&i| looks_like_node(&rest_trimmed[i..]))
        .map(|i| i + offset)
}

/// Checks if a string starts with a device path node name followed by an opening parenthesis.
fn looks_like_node(s: &str) -> bool {
    let bytes = s.as_bytes();
    let name_len = bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    name_len > 0 && bytes[0].is_ascii_alphabetic() && bytes.get(name_len) == Some(&b'(')
}

/// Creates an [`ParseError::InvalidId`] for a line.
fn invalid_id(line: &str) -> ParseError {
    ParseError::InvalidId {
        line: line.to_owned(),
    }
}

/// Creates a [`ParseError::DuplicateSummary`] for a line.
fn duplicate_summary(line: &str) -> ParseError {
    ParseError::DuplicateSummary {
        line: line.to_owned(),
    }
}

// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! Selecting an entry to boot once, without touching the persistent order.

use thiserror::Error;

use crate::{
    boot::action::BootAction,
    table::{BootTable, types::BootId},
};

/// Errors that may result from selecting a one-time boot target.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NextError {
    /// The entry does not exist in the table.
    #[error("Boot{0} does not exist")]
    UnknownId(BootId),
}

/// Returns the [`BootAction`] that boots an entry once on the next boot.
///
/// # Errors
///
/// May return an `Error` if the entry does not exist in the table.
pub fn set_once(table: &BootTable, id: BootId) -> Result<BootAction, NextError> {
    if table.contains(id) {
        Ok(BootAction::SetNext(id))
    } else {
        Err(NextError::UnknownId(id))
    }
}

/// Returns the [`BootAction`] that removes the one-time boot target, or [`None`] if none is set.
#[must_use = "Has no effect if the result is unused"]
pub fn clear_once(table: &BootTable) -> Option<BootAction> {
    table.boot_next().map(|_| BootAction::ClearNext)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "BootOrder: 0001,0002\nBoot0001* Linux\nBoot0002* Windows\n";

    #[test]
    fn test_set_once() {
        let table = BootTable::parse(LISTING).expect("listing in test should parse");
        assert_eq!(
            set_once(&table, BootId::new(2)),
            Ok(BootAction::SetNext(BootId::new(2)))
        );
        assert_eq!(
            set_once(&table, BootId::new(5)),
            Err(NextError::UnknownId(BootId::new(5)))
        );
    }

    #[test]
    fn test_clear_once() {
        let table = BootTable::parse(LISTING).expect("listing in test should parse");
        assert_eq!(clear_once(&table), None);

        let table = BootTable::parse(&format!("BootNext: 0002\n{LISTING}"))
            .expect("listing in test should parse");
        assert_eq!(clear_once(&table), Some(BootAction::ClearNext));
    }
}

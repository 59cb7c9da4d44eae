// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! `newtype` definitions for the fields of [`super::BootTable`]
//!
//! At the moment, this includes the following type definitions:
//! - [`BootId`] (constructor enforces exactly four hexadecimal digits)
//! - [`BootOrder`] (a sequence of [`BootId`]s that serializes the way `efibootmgr -o` expects it)

use std::{fmt, ops::Deref, str::FromStr};

use thiserror::Error;

/// The amount of hex digits in a firmware boot index.
const ID_LEN: usize = 4;

/// Errors that may happen from invalid inputs to the respective constructors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TypeError {
    /// The boot identifier was invalid.
    #[error("\"{0}\" is not a valid boot identifier")]
    BootId(String),
}

/// A firmware boot index, such as the `0001` of `Boot0001`.
///
/// It is always displayed as four uppercase hex digits, which is how both the firmware variable names and
/// `efibootmgr` arguments spell it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BootId(u16);

impl BootId {
    /// Creates a new [`BootId`] from its numeric value.
    #[must_use = "Has no effect if the result is unused"]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Parses a [`BootId`] from exactly four hex digits, in either case.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the string is not exactly four hex digits long.
    pub fn from_hex(id: &str) -> Result<Self, TypeError> {
        if id.len() != ID_LEN || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TypeError::BootId(id.to_owned()));
        }
        u16::from_str_radix(id, 16)
            .map(Self)
            .map_err(|_| TypeError::BootId(id.to_owned()))
    }

    /// Returns the numeric value of the [`BootId`].
    #[must_use = "Has no effect if the result is unused"]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for BootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

impl FromStr for BootId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// The persistent boot priority, highest priority first.
///
/// Displaying a [`BootOrder`] gives the comma separated form that `efibootmgr` both prints and accepts, such as
/// `0003,0001,0002`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BootOrder(Vec<BootId>);

impl BootOrder {
    /// Creates a new [`BootOrder`] from a list of [`BootId`]s.
    #[must_use = "Has no effect if the result is unused"]
    pub const fn new(ids: Vec<BootId>) -> Self {
        Self(ids)
    }

    /// Returns the position of a [`BootId`] in the order, if it is present.
    #[must_use = "Has no effect if the result is unused"]
    pub fn position(&self, id: BootId) -> Option<usize> {
        self.0.iter().position(|&x| x == id)
    }

    /// Consumes the [`BootOrder`], returning the inner [`Vec<BootId>`].
    #[must_use = "Has no effect if the result is unused"]
    pub fn into_inner(self) -> Vec<BootId> {
        self.0
    }

    /// Swaps two positions of the order.
    pub(crate) fn swap(&mut self, a: usize, b: usize) {
        self.0.swap(a, b);
    }
}

impl Deref for BootOrder {
    type Target = [BootId];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<BootId> for BootOrder {
    fn from_iter<I: IntoIterator<Item = BootId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for BootOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{id}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_boot_id() {
        assert_eq!(BootId::from_hex("0001"), Ok(BootId::new(1)));
        assert_eq!(BootId::from_hex("00af"), Ok(BootId::new(0xAF)));
        assert_eq!(BootId::new(0x1A).to_string(), "001A");
        assert!(BootId::from_hex("001").is_err());
        assert!(BootId::from_hex("00011").is_err());
        assert!(BootId::from_hex("+001").is_err());
        assert!(BootId::from_hex("00G1").is_err());
    }

    #[test]
    fn test_order_display() {
        let order: BootOrder = [3, 1, 2].into_iter().map(BootId::new).collect();
        assert_eq!(order.to_string(), "0003,0001,0002");
        assert_eq!(BootOrder::default().to_string(), "");
    }

    proptest! {
        #[test]
        fn id_display_parses_back(x in any::<u16>()) {
            let id = BootId::new(x);
            prop_assert_eq!(id.to_string().parse::<BootId>(), Ok(id));
        }
    }
}

// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! The `bootswitch` library crate.
//!
//! This is the engine behind the `bootswitch` frontends. It reads the firmware boot table through `efibootmgr`,
//! lets a frontend reorder the persistent boot order or pick a one-time boot target, applies those changes through
//! a privileged executor, and guards the final reboot behind a cancellable countdown.
//!
//! The frontend only ever deals with a [`boot::BootMgr`], the [`table::BootTable`] it owns, and a
//! [`boot::countdown::Countdown`]. Everything that touches the system goes through the [`system::exec::Executor`] and
//! [`system::listing::ListingSource`] traits, so that a frontend (or a test) may substitute its own implementation.
//!
//! ## MSRV
//!
//! The minimum supported rust version is 1.88.0.

/// The primary result type that wraps around [`crate::error::BootError`].
pub type BootResult<T> = Result<T, crate::error::BootError>;

pub mod boot;
pub mod error;
pub mod system;
pub mod table;

#[cfg(test)]
mod testing;

// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! An in-memory firmware for tests.
//!
//! [`FakeFirmware`] is both the [`ListingSource`] and the [`Executor`] of a session. It answers listings by
//! rendering its [`BootTable`], and applies `efibootmgr` invocations to that table when the right password is given.

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use crate::{
    system::{
        exec::{ExecError, ExecOutput, Executor, Invocation},
        listing::ListingSource,
        secret::Password,
    },
    table::{
        BootTable,
        types::{BootId, BootOrder},
    },
};

/// A failure the next privileged command should run into.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Failure {
    /// The command exits with an error.
    NonZeroExit,
    /// The command never finishes.
    Timeout,
    /// The elevation program is missing.
    ToolNotFound,
    /// The command never finishes, and could not be stopped.
    Abandoned,
}

/// The mutable part of [`FakeFirmware`].
struct State {
    /// What the firmware holds.
    table: BootTable,
    /// Every command that changed something, in order.
    runs: Vec<Invocation>,
    /// A failure for the next command.
    failure: Option<Failure>,
    /// A listing returned in place of the rendered table.
    listing: Option<String>,
}

/// A firmware double.
pub(crate) struct FakeFirmware {
    /// The only accepted password.
    password: String,
    /// The firmware state.
    state: Mutex<State>,
}

impl FakeFirmware {
    /// Creates a firmware holding the table of a listing.
    pub(crate) fn new(listing: &str, password: &str) -> Arc<Self> {
        Arc::new(Self {
            password: password.to_owned(),
            state: Mutex::new(State {
                table: BootTable::parse(listing).expect("fake firmware listing should parse"),
                runs: Vec::new(),
                failure: None,
                listing: None,
            }),
        })
    }

    /// Locks the state.
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("fake firmware lock is not poisoned")
    }

    /// Returns what the firmware holds.
    pub(crate) fn table(&self) -> BootTable {
        self.state().table.clone()
    }

    /// Returns every command that was accepted.
    pub(crate) fn runs(&self) -> Vec<Invocation> {
        self.state().runs.clone()
    }

    /// Makes the next privileged command fail.
    pub(crate) fn fail_next(&self, failure: Failure) {
        self.state().failure = Some(failure);
    }

    /// Makes every following listing return some text.
    pub(crate) fn set_listing(&self, listing: &str) {
        self.state().listing = Some(listing.to_owned());
    }
}

impl ListingSource for FakeFirmware {
    fn read_listing(&self) -> Result<String, ExecError> {
        let state = self.state();
        Ok(state
            .listing
            .clone()
            .unwrap_or_else(|| state.table.to_string()))
    }
}

impl Executor for FakeFirmware {
    fn run(&self, invocation: &Invocation, password: Password) -> Result<ExecOutput, ExecError> {
        if password.expose() != self.password {
            return Err(ExecError::IncorrectPassword);
        }
        drop(password);

        let mut state = self.state();
        match state.failure.take() {
            Some(Failure::NonZeroExit) => {
                return Err(ExecError::NonZeroExit {
                    code: Some(1),
                    stderr: "Could not set variable".to_owned(),
                });
            }
            Some(Failure::Timeout) => return Err(ExecError::Timeout(Duration::from_secs(30))),
            Some(Failure::ToolNotFound) => return Err(ExecError::ToolNotFound("sudo".to_owned())),
            Some(Failure::Abandoned) => return Err(ExecError::Abandoned(Duration::from_secs(30))),
            None => (),
        }

        let args: Vec<&str> = invocation.args.iter().map(String::as_str).collect();
        let table = match args.as_slice() {
            ["-o", order] => {
                let order: BootOrder = order
                    .split(',')
                    .map(|id| id.parse::<BootId>().expect("fake firmware got a valid id"))
                    .collect();
                Some(state.table.with_order(order))
            }
            ["-n", id] => {
                let id = id.parse().expect("fake firmware got a valid id");
                Some(state.table.with_boot_next(Some(id)))
            }
            ["-N"] => Some(state.table.with_boot_next(None)),
            _ => None,
        };

        if let Some(table) = table {
            state.table = table;
        }
        state.runs.push(invocation.clone());
        Ok(ExecOutput::default())
    }
}

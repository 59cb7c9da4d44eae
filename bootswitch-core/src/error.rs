// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! Provides [`BootError`], which encapsulates other errors

use thiserror::Error;

/// An `Error` resulting from the program.
#[derive(Error, Debug)]
pub enum BootError {
    /// The firmware listing could not be parsed.
    #[error("Parse Error: {0}")]
    Parse(#[from] crate::table::parser::ParseError),

    /// A command could not be run, or it reported a failure.
    #[error("Exec Error: {0}")]
    Exec(#[from] crate::system::exec::ExecError),

    /// An operation on the boot order was invalid.
    #[error("Order Error: {0}")]
    Order(#[from] crate::boot::order::OrderError),

    /// A one-time boot target was invalid.
    #[error("BootNext Error: {0}")]
    Next(#[from] crate::boot::next::NextError),

    /// A desired order was not a permutation of the firmware order.
    ///
    /// This can only be reached through a bug, not through normal operator input.
    #[error("Invariant violated: {0}")]
    InvariantViolation(crate::boot::order::OrderError),

    /// A privileged command is still running for this table.
    #[error("A privileged command is still running")]
    Busy,

    /// A result was handed back while no privileged command was running.
    #[error("No privileged command is running")]
    NotRunning,

    /// The outcome of an earlier command is unknown, so the table has to be read again before the next one.
    #[error("The last command may still be running, reload the boot table first")]
    ReloadRequired,
}

impl BootError {
    /// Checks if the error should end the whole session.
    ///
    /// This is the case when the firmware tool or elevation program is missing, since nothing else can be done
    /// afterwards.
    #[must_use = "Has no effect if the result is unused"]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Exec(crate::system::exec::ExecError::ToolNotFound(_))
        )
    }

    /// Checks if the table has to be read again before anything else is written.
    #[must_use = "Has no effect if the result is unused"]
    pub const fn needs_reload(&self) -> bool {
        matches!(
            self,
            Self::Parse(_)
                | Self::ReloadRequired
                | Self::Exec(crate::system::exec::ExecError::Abandoned(_))
        )
    }

    /// Checks if the error means the password was wrong, so the operator should be asked again.
    #[must_use = "Has no effect if the result is unused"]
    pub const fn is_incorrect_password(&self) -> bool {
        matches!(
            self,
            Self::Exec(crate::system::exec::ExecError::IncorrectPassword)
        )
    }
}

// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! Reading the firmware boot table.
//!
//! Listing the boot table does not need any privileges, so [`EfiBootMgr`] simply runs `efibootmgr -v` as the
//! current user.

use std::io;

use duct::cmd;
use log::debug;

use crate::{boot::config::BootConfig, system::exec::ExecError};

/// The argument that makes `efibootmgr` print device paths.
const VERBOSE_ARG: &str = "-v";

/// A source of the verbose firmware boot table listing.
pub trait ListingSource: Send + Sync {
    /// Reads the current listing.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the tool does not exist or reports a failure.
    fn read_listing(&self) -> Result<String, ExecError>;
}

/// A [`ListingSource`] that runs `efibootmgr`.
#[derive(Clone, Debug)]
pub struct EfiBootMgr {
    /// The path or name of the `efibootmgr` binary.
    program: String,
}

impl EfiBootMgr {
    /// Creates a new [`EfiBootMgr`] from a [`BootConfig`].
    #[must_use = "Has no effect if the result is unused"]
    pub fn new(config: &BootConfig) -> Self {
        Self {
            program: config.efibootmgr.clone(),
        }
    }
}

impl ListingSource for EfiBootMgr {
    fn read_listing(&self) -> Result<String, ExecError> {
        debug!("Reading boot table with {} {VERBOSE_ARG}", self.program);

        let output = cmd(self.program.as_str(), [VERBOSE_ARG])
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ExecError::ToolNotFound(self.program.clone()),
                _ => ExecError::Io(e),
            })?;

        if !output.status.success() {
            return Err(ExecError::NonZeroExit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool() {
        let listing = EfiBootMgr {
            program: "/nonexistent/efibootmgr".to_owned(),
        };
        assert!(matches!(
            listing.read_listing(),
            Err(ExecError::ToolNotFound(_))
        ));
    }

    #[test]
    fn test_reads_stdout() {
        // echo prints its arguments, which stands in for the listing here
        let listing = EfiBootMgr {
            program: "echo".to_owned(),
        };
        assert_eq!(listing.read_listing().ok().as_deref(), Some("-v\n"));
    }

    #[test]
    fn test_failure() {
        let listing = EfiBootMgr {
            program: "false".to_owned(),
        };
        assert!(matches!(
            listing.read_listing(),
            Err(ExecError::NonZeroExit { code: Some(1), .. })
        ));
    }
}

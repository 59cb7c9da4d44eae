// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! The `bootswitch` application.
//!
//! This provides a [`main`] function that loads the configuration, reads the firmware boot table, and runs the
//! terminal UI on top of it. Log records are kept away from the terminal while the UI owns it: they either go to the
//! configured log file or are printed to stderr once the terminal has been restored.

use std::process::ExitCode;

use bootswitch_core::{
    boot::{BootMgr, config::BootConfig},
    system::log_backend::FileLogger,
};
use log::{LevelFilter, warn};
use thiserror::Error;

use crate::{
    app::{App, AppState},
    ui::backend::TerminalGuard,
};

mod app;
mod ui;

/// The global logging instance.
static LOGGER: FileLogger = FileLogger::new();

/// An error that may occur when running the application.
#[derive(Error, Debug)]
pub enum MainError {
    /// An error occurred with the boot manager.
    #[error("Boot Error: {0}")]
    BootError(#[from] bootswitch_core::error::BootError),

    /// An error occurred while running the App.
    #[error("App Error: {0}")]
    AppError(#[from] crate::app::AppError),

    /// The terminal could not be set up, drawn to, or read from.
    #[error("Terminal Error: {0}")]
    Terminal(#[from] std::io::Error),
}

/// The actual main function of the program.
///
/// # Errors
///
/// May return an `Error` if the boot table could not be loaded, the terminal could not be initialized, or a fatal
/// failure occurs while the `App` is run.
fn main_func() -> Result<AppState, MainError> {
    let config = BootConfig::new();
    log::set_max_level(config.log_level);
    if let Some(path) = &config.log_file
        && let Err(e) = LOGGER.log_to_file(path)
    {
        warn!("Could not open log file {}: {e}", path.display());
    }

    let boot_mgr = BootMgr::from_config(config)?;
    let mut app = App::new(boot_mgr);

    let mut terminal = TerminalGuard::new()?;
    app.run(terminal.terminal_mut())
}

/// The main function of the program.
fn main() -> ExitCode {
    let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(LevelFilter::Warn)); // if the logger was already set, then ignore it

    let result = main_func();

    // the terminal is restored by now
    for line in LOGGER.take_buffered() {
        eprintln!("{line}");
    }

    match result {
        Ok(AppState::Rebooting) => {
            eprintln!("Rebooting");
            ExitCode::SUCCESS
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("bootswitch: {e}");
            ExitCode::FAILURE
        }
    }
}

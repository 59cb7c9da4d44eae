// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! The main application logic.
//!
//! This is where the main loop of the whole application is located, and is where the terminal, the boot manager,
//! privileged jobs, and the reboot countdown interact. Each iteration of the loop draws a frame, handles input, picks
//! up a finished job, and then advances the countdown, in that order. Cancelling the countdown is therefore always
//! seen before the tick that would have fired it.

use std::{
    fmt,
    sync::mpsc::{self, Receiver, Sender},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use bootswitch_core::{
    BootResult,
    boot::{BootMgr, Job, JobResult, countdown::Countdown},
    error::BootError,
    system::{exec::ExecOutput, secret::Password},
    table::types::BootId,
};
use log::{error, info};
use thiserror::Error;

use crate::{
    MainError,
    ui::{backend::Tui, boot_list::BootList, theme::Theme},
};

mod input;

/// The interval between two countdown ticks.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// An `Error` that may result from running the [`App`].
#[derive(Error, Debug)]
pub enum AppError {
    /// A privileged job ended without reporting a result.
    #[error("A privileged job ended without a result")]
    JobLost,
}

/// The current status of the [`App`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppState {
    /// The app is currently running in its main loop.
    Running,

    /// The app is currently exiting.
    Exiting,

    /// The reboot command was dispatched.
    Rebooting,
}

/// The panel that has the focus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Panel {
    /// The persistent boot order.
    Priority,

    /// The one-time boot target.
    Once,
}

impl Panel {
    /// Returns the other panel.
    #[must_use = "Has no effect if the result is unused"]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Priority => Self::Once,
            Self::Once => Self::Priority,
        }
    }
}

/// What a password is asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Purpose {
    /// Writing the pending order.
    ApplyOrder,

    /// Booting an entry once.
    SetNext(BootId),

    /// Removing the one-time boot target.
    ClearNext,

    /// Rebooting the machine.
    Reboot,
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApplyOrder => f.write_str("Save boot order"),
            Self::SetNext(id) => write!(f, "Boot {id} once"),
            Self::ClearNext => f.write_str("Clear one-time boot"),
            Self::Reboot => f.write_str("Reboot"),
        }
    }
}

/// A popup that takes over the input.
#[derive(Debug)]
pub enum Prompt {
    /// Asking for the password.
    Password {
        /// What the password is for.
        purpose: Purpose,
        /// What was typed so far.
        password: Password,
        /// Whether the password is shown in clear text.
        visible: bool,
    },

    /// Asking whether to reboot after the order was saved.
    ConfirmReboot,
}

/// A message in the status line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    /// The message.
    pub text: String,

    /// Whether the message reports an error.
    pub error: bool,
}

/// What a job thread reports back.
enum Outcome {
    /// The result of a change to the boot table, still to be finished by the [`BootMgr`].
    Change(JobResult),

    /// The result of the reboot command.
    Reboot(BootResult<ExecOutput>),
}

/// A job that is running on another thread.
struct RunningJob {
    /// What the job is for.
    purpose: Purpose,

    /// A copy of the password for the countdown that follows a one-time boot.
    password: Option<Password>,

    /// The thread running the job.
    handle: JoinHandle<()>,
}

/// The main application logic of the boot switcher.
pub struct App {
    /// The session controller.
    pub boot_mgr: BootMgr,

    /// The list of the "Boot Priority" panel.
    pub priority: BootList,

    /// The list of the "Boot Once" panel.
    pub once: BootList,

    /// The panel that has the focus.
    pub panel: Panel,

    /// The popup that is currently shown, if any.
    pub prompt: Option<Prompt>,

    /// The reboot countdown.
    pub countdown: Countdown,

    /// When the countdown ticks next.
    next_tick: Instant,

    /// The [`Theme`] of the UI.
    pub theme: Theme,

    /// The last status or error message.
    pub status: Option<Status>,

    /// The current state of the [`App`].
    pub state: AppState,

    /// The job that is currently running, if any.
    job: Option<RunningJob>,

    /// Hands results from job threads to the loop.
    results_tx: Sender<Outcome>,

    /// Receives results from job threads.
    results_rx: Receiver<Outcome>,
}

impl App {
    /// Initializes the state of the [`App`] around a [`BootMgr`].
    #[must_use = "Has no effect if the result is unused"]
    pub fn new(boot_mgr: BootMgr) -> Self {
        let theme = Theme::new(&boot_mgr.config);
        let (results_tx, results_rx) = mpsc::channel();

        let mut app = Self {
            priority: BootList::priority(&boot_mgr),
            once: BootList::once(&boot_mgr),
            boot_mgr,
            panel: Panel::Priority,
            prompt: None,
            countdown: Countdown::new(),
            next_tick: Instant::now(),
            theme,
            status: None,
            state: AppState::Running,
            job: None,
            results_tx,
            results_rx,
        };

        if let Some(id) = app.boot_mgr.table().boot_next() {
            app.set_status(format!("Boot{id} is set to boot once"));
        }
        app
    }

    /// Provides the main loop for the [`App`].
    ///
    /// Returns the state the app ended in, which is either [`AppState::Exiting`] or [`AppState::Rebooting`].
    ///
    /// # Errors
    ///
    /// May return an `Error` if a frame could not be drawn, the input could not be read, or a fatal error happened
    /// in the boot manager.
    pub fn run(&mut self, terminal: &mut Tui) -> Result<AppState, MainError> {
        while self.state == AppState::Running {
            self.draw(terminal)?;
            self.handle_events()?;
            self.handle_job_result()?;
            self.tick_countdown();
        }

        Ok(self.state)
    }

    /// Returns what the running job is for, if a job is running.
    #[must_use = "Has no effect if the result is unused"]
    pub fn running_job(&self) -> Option<Purpose> {
        self.job.as_ref().map(|job| job.purpose)
    }

    /// Sets a status message.
    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            error: false,
        });
    }

    /// Sets an error message.
    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            error: true,
        });
    }

    /// Rebuilds both lists from the [`BootMgr`].
    pub fn rebuild_lists(&mut self) {
        self.priority.replace(BootList::priority(&self.boot_mgr));
        self.once.replace(BootList::once(&self.boot_mgr));
    }

    /// Starts the job for a purpose, if there is anything to do.
    fn submit(&mut self, purpose: Purpose, password: Password) {
        let job = match purpose {
            Purpose::ApplyOrder => self.boot_mgr.begin_apply_order(),
            Purpose::SetNext(id) => self.boot_mgr.begin_set_next(id).map(Some),
            Purpose::ClearNext => self.boot_mgr.begin_clear_next(),
            Purpose::Reboot => {
                self.arm_countdown(password);
                return;
            }
        };

        match job {
            Ok(Some(job)) => self.spawn_job(job, purpose, password),
            Ok(None) => self.set_status("Nothing to do"),
            Err(e) => self.report(&e),
        }
    }

    /// Runs a job on another thread.
    ///
    /// Only a one-time boot keeps a copy of the password, for the countdown that is armed right after it.
    fn spawn_job(&mut self, job: Job, purpose: Purpose, password: Password) {
        info!("Running job: {}", job.action());
        let kept = matches!(purpose, Purpose::SetNext(_)).then(|| password.clone());
        let executor = self.boot_mgr.executor();

        self.spawn(purpose, kept, move || {
            Outcome::Change(job.run(&*executor, password))
        });
        self.set_status(format!("{purpose}..."));
    }

    /// Runs some privileged work on another thread, which reports back through the channel.
    fn spawn(
        &mut self,
        purpose: Purpose,
        password: Option<Password>,
        work: impl FnOnce() -> Outcome + Send + 'static,
    ) {
        let tx = self.results_tx.clone();
        let handle = thread::spawn(move || {
            let _ = tx.send(work()); // the receiver outlives every job
        });

        self.job = Some(RunningJob {
            purpose,
            password,
            handle,
        });
    }

    /// Picks up the result of the running job, if it is done.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the job thread died without a result, or the result is fatal.
    fn handle_job_result(&mut self) -> Result<(), MainError> {
        let Some(job) = &self.job else {
            return Ok(());
        };

        // checked before receiving, so that a result sent right before the thread ended is never missed
        let finished = job.handle.is_finished();
        let outcome = match self.results_rx.try_recv() {
            Ok(outcome) => outcome,
            Err(_) if finished => return Err(AppError::JobLost.into()),
            Err(_) => return Ok(()),
        };

        if let Some(job) = self.job.take() {
            self.deliver(outcome, job.purpose, job.password)?;
        }
        Ok(())
    }

    /// Acts on what a job thread reported.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the result is fatal.
    fn deliver(
        &mut self,
        outcome: Outcome,
        purpose: Purpose,
        password: Option<Password>,
    ) -> Result<(), MainError> {
        match outcome {
            Outcome::Change(result) => self.finish_job(result, purpose, password),
            Outcome::Reboot(result) => self.finish_reboot(result),
        }
    }

    /// Hands a job result back to the [`BootMgr`] and moves on to what comes next.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the result is fatal.
    fn finish_job(
        &mut self,
        result: JobResult,
        purpose: Purpose,
        password: Option<Password>,
    ) -> Result<(), MainError> {
        let outcome = self.boot_mgr.finish(result);
        self.rebuild_lists();

        match outcome {
            Ok(completed) => {
                info!("Completed: {}", completed.action);
                match purpose {
                    Purpose::ApplyOrder => {
                        self.set_status("Boot order saved");
                        self.prompt = Some(Prompt::ConfirmReboot);
                    }
                    Purpose::SetNext(id) => {
                        self.set_status(format!("Boot{id} will be booted once"));
                        if let Some(password) = password {
                            self.arm_countdown(password);
                        }
                    }
                    Purpose::ClearNext => self.set_status("One-time boot cleared"),
                    Purpose::Reboot => (),
                }
            }
            Err(e) if e.is_incorrect_password() => {
                self.set_error("Incorrect password");
                self.ask_password(purpose);
            }
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => self.report(&e),
        }
        Ok(())
    }

    /// Starts a fresh reboot countdown.
    fn arm_countdown(&mut self, password: Password) {
        let mut countdown = Countdown::new();
        match countdown.arm(password) {
            Ok(()) => {
                self.countdown = countdown;
                self.next_tick = Instant::now() + TICK_INTERVAL;
            }
            Err(e) => error!("Could not start countdown: {e}"),
        }
    }

    /// Advances the countdown once a second, and starts the reboot on another thread if it expires.
    fn tick_countdown(&mut self) {
        if !self.countdown.is_counting() || Instant::now() < self.next_tick {
            return;
        }
        self.next_tick += TICK_INTERVAL;

        let Some(dispatch) = self.countdown.tick() else {
            return;
        };

        let executor = self.boot_mgr.executor();
        let config = self.boot_mgr.config.clone();
        self.spawn(Purpose::Reboot, None, move || {
            Outcome::Reboot(dispatch.run(&*executor, &config))
        });
        self.set_status("Rebooting...");
    }

    /// Acts on the result of the reboot command.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the reboot command does not exist.
    fn finish_reboot(&mut self, result: BootResult<ExecOutput>) -> Result<(), MainError> {
        match result {
            Ok(_) => self.state = AppState::Rebooting,
            Err(e) if e.is_incorrect_password() => {
                self.set_error("Incorrect password");
                self.ask_password(Purpose::Reboot);
            }
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => self.set_error(format!("Could not reboot: {e}")),
        }
        Ok(())
    }

    /// Shows a non fatal [`BootError`] in the status line.
    fn report(&mut self, e: &BootError) {
        let text = if e.needs_reload() {
            format!("{e} (press r to reload)")
        } else {
            e.to_string()
        };
        self.set_error(text);
    }
}

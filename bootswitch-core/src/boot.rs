// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! Provides [`BootMgr`], a struct which owns the boot table for one interactive session.
//!
//! Every privileged change goes through a [`Job`]. A job is started with one of the `begin_*` methods, which marks
//! the session as busy, then run on any thread with [`Job::run`], then handed back with [`BootMgr::finish`]. While a
//! job is out, the session refuses to edit the pending order or to start another job, so at most one command is
//! ever writing to the firmware.
//!
//! A command that timed out and could not be stopped may still be writing after its job was finished. The session
//! then refuses new jobs until the table was read again with [`BootMgr::reload`].

use std::sync::Arc;

use log::{error, info, warn};

use crate::{
    BootResult,
    boot::{
        action::BootAction,
        config::BootConfig,
        order::{Direction, check_permutation, diff},
    },
    error::BootError,
    system::{
        exec::{ExecError, ExecOutput, Executor, Invocation, SudoExecutor},
        listing::{EfiBootMgr, ListingSource},
        secret::Password,
    },
    table::{
        BootEntry, BootTable,
        types::{BootId, BootOrder},
    },
};

pub mod action;
pub mod config;
pub mod countdown;
pub mod next;
pub mod order;

/// One packaged privileged command.
#[derive(Clone, Debug)]
pub struct Job {
    /// What the command does.
    action: BootAction,

    /// The command line.
    invocation: Invocation,
}

impl Job {
    /// Returns the [`BootAction`] of the job.
    #[must_use = "Has no effect if the result is unused"]
    pub const fn action(&self) -> &BootAction {
        &self.action
    }

    /// Returns the [`Invocation`] of the job.
    #[must_use = "Has no effect if the result is unused"]
    pub const fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// Runs the job through an executor, consuming the password.
    ///
    /// This may block for as long as the executor allows, so a frontend should call it off its event loop.
    #[must_use = "The result must be handed back to BootMgr::finish"]
    pub fn run(self, executor: &dyn Executor, password: Password) -> JobResult {
        let result = executor.run(&self.invocation, password);
        JobResult {
            action: self.action,
            result,
        }
    }
}

/// The outcome of a [`Job`], to be handed back to [`BootMgr::finish`].
#[derive(Debug)]
pub struct JobResult {
    /// The action that was run.
    action: BootAction,

    /// What the executor returned.
    result: Result<ExecOutput, ExecError>,
}

impl JobResult {
    /// Returns the [`BootAction`] that was run.
    #[must_use = "Has no effect if the result is unused"]
    pub const fn action(&self) -> &BootAction {
        &self.action
    }
}

/// A privileged change that succeeded, after the table was read back from the firmware.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completed {
    /// The action that was applied.
    pub action: BootAction,

    /// The output of the command.
    pub output: ExecOutput,
}

/// The session controller.
pub struct BootMgr {
    /// The configuration of the session.
    pub config: BootConfig,

    /// Where the firmware listing comes from.
    listing: Arc<dyn ListingSource>,

    /// What runs privileged commands.
    executor: Arc<dyn Executor>,

    /// The table as last read from the firmware.
    table: BootTable,

    /// The order the operator is editing. Always a permutation of the order of `table`.
    pending: BootOrder,

    /// The action of the job that is currently out, if any.
    in_flight: Option<BootAction>,

    /// Whether the outcome of the last job is unknown.
    stale: bool,
}

impl BootMgr {
    /// Creates a new [`BootMgr`] with a listing source and an executor.
    ///
    /// The table is loaded right away, and the pending order starts out as the firmware order.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the listing could not be read or parsed.
    pub fn new(
        config: BootConfig,
        listing: Arc<dyn ListingSource>,
        executor: Arc<dyn Executor>,
    ) -> BootResult<Self> {
        let table = load_table(&*listing)?;
        info!(
            "Loaded {} boot entries, order {}",
            table.entries().len(),
            table.order()
        );

        Ok(Self {
            config,
            listing,
            executor,
            pending: table.order().clone(),
            table,
            in_flight: None,
            stale: false,
        })
    }

    /// Creates a new [`BootMgr`] that talks to the real firmware through `efibootmgr` and `sudo`.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the listing could not be read or parsed.
    pub fn from_config(config: BootConfig) -> BootResult<Self> {
        let listing = Arc::new(EfiBootMgr::new(&config));
        let executor = Arc::new(SudoExecutor::new(&config));
        Self::new(config, listing, executor)
    }

    /// Returns a reference to the current [`BootTable`].
    #[must_use = "Has no effect if the result is unused"]
    pub const fn table(&self) -> &BootTable {
        &self.table
    }

    /// Returns the pending [`BootOrder`].
    #[must_use = "Has no effect if the result is unused"]
    pub const fn pending(&self) -> &BootOrder {
        &self.pending
    }

    /// Checks if the pending order differs from the firmware order.
    #[must_use = "Has no effect if the result is unused"]
    pub fn has_pending_changes(&self) -> bool {
        &self.pending != self.table.order()
    }

    /// Returns the [`BootEntry`]s in the pending order.
    pub fn entries_in_pending_order(&self) -> impl Iterator<Item = &BootEntry> {
        self.table.entries_in(&self.pending)
    }

    /// Checks if a job is currently out.
    #[must_use = "Has no effect if the result is unused"]
    pub const fn busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Checks if the table has to be reloaded before the next job.
    #[must_use = "Has no effect if the result is unused"]
    pub const fn needs_reload(&self) -> bool {
        self.stale
    }

    /// Returns a shared handle to the executor of the session, for running jobs on other threads.
    #[must_use = "Has no effect if the result is unused"]
    pub fn executor(&self) -> Arc<dyn Executor> {
        Arc::clone(&self.executor)
    }

    /// Moves an entry of the pending order one place up or down.
    ///
    /// # Errors
    ///
    /// May return an `Error` if a job is out, or if the entry is not in the order.
    pub fn move_entry(&mut self, id: BootId, direction: Direction) -> BootResult<()> {
        self.ensure_idle()?;
        self.pending = order::move_entry(&self.pending, id, direction)?;
        Ok(())
    }

    /// Discards the pending edits.
    ///
    /// # Errors
    ///
    /// May return an `Error` if a job is out.
    pub fn reset_pending(&mut self) -> BootResult<()> {
        self.ensure_idle()?;
        self.pending = self.table.order().clone();
        Ok(())
    }

    /// Reads the table from the firmware again, discarding the pending edits.
    ///
    /// If the listing can not be read or parsed, the previous table is kept.
    ///
    /// # Errors
    ///
    /// May return an `Error` if a job is out, or if the listing could not be read or parsed.
    pub fn reload(&mut self) -> BootResult<()> {
        self.ensure_idle()?;
        self.table = load_table(&*self.listing)?;
        self.pending = self.table.order().clone();
        self.stale = false;
        Ok(())
    }

    /// Starts a job that writes the pending order.
    ///
    /// Returns [`None`] if the pending order is the firmware order, in which case the session stays idle.
    ///
    /// # Errors
    ///
    /// May return an `Error` if a job is already out, or if the table has to be reloaded first.
    pub fn begin_apply_order(&mut self) -> BootResult<Option<Job>> {
        self.begin_apply(self.pending.clone())
    }

    /// Starts a job that writes an arbitrary order.
    ///
    /// Returns [`None`] if the order is the firmware order, in which case the session stays idle.
    ///
    /// # Errors
    ///
    /// May return an `Error` if a job is already out, or if the order is not a permutation of the firmware order.
    pub fn begin_apply(&mut self, desired: BootOrder) -> BootResult<Option<Job>> {
        self.ensure_ready()?;

        if let Err(e) = check_permutation(self.table.order(), &desired) {
            error!("Refusing to write boot order: {e}");
            return Err(BootError::InvariantViolation(e));
        }

        Ok(diff(self.table.order(), &desired)
            .into_action()
            .map(|action| self.start(action)))
    }

    /// Starts a job that boots an entry once on the next boot.
    ///
    /// # Errors
    ///
    /// May return an `Error` if a job is already out, or if the entry does not exist.
    pub fn begin_set_next(&mut self, id: BootId) -> BootResult<Job> {
        self.ensure_ready()?;
        let action = next::set_once(&self.table, id)?;
        Ok(self.start(action))
    }

    /// Starts a job that removes the one-time boot target.
    ///
    /// Returns [`None`] if no target is set, in which case the session stays idle.
    ///
    /// # Errors
    ///
    /// May return an `Error` if a job is already out.
    pub fn begin_clear_next(&mut self) -> BootResult<Option<Job>> {
        self.ensure_ready()?;
        Ok(next::clear_once(&self.table).map(|action| self.start(action)))
    }

    /// Hands back the result of a [`Job`], which makes the session idle again.
    ///
    /// On success the table is read back from the firmware. The pending order becomes the new firmware order after
    /// an order change, and is kept otherwise. On failure the table and the pending order are left untouched.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the job failed, if no job was out, or if the table could not be read back.
    pub fn finish(&mut self, result: JobResult) -> BootResult<Completed> {
        let Some(action) = self.in_flight.take() else {
            return Err(BootError::NotRunning);
        };
        if action != result.action {
            warn!("Finished \"{}\" while \"{action}\" was running", result.action);
        }

        let output = match result.result {
            Ok(output) => output,
            Err(e) => {
                warn!("Could not {action}: {e}");
                if matches!(e, ExecError::Abandoned(_)) {
                    self.stale = true;
                }
                return Err(e.into());
            }
        };
        info!("Applied: {action}");

        self.table = load_table(&*self.listing)?;
        if action.changes_order() || check_permutation(self.table.order(), &self.pending).is_err() {
            self.pending = self.table.order().clone();
        }

        Ok(Completed { action, output })
    }

    /// Writes the pending order, blocking until the command is done.
    ///
    /// Returns [`None`] if nothing needed to be written.
    ///
    /// # Errors
    ///
    /// May return an `Error` if a job is already out, or if the command failed.
    pub fn apply_order(&mut self, password: Password) -> BootResult<Option<Completed>> {
        self.apply(self.pending.clone(), password)
    }

    /// Writes an arbitrary order, blocking until the command is done.
    ///
    /// Returns [`None`] if nothing needed to be written.
    ///
    /// # Errors
    ///
    /// May return an `Error` if a job is already out, if the order is not a permutation of the firmware order, or if
    /// the command failed.
    pub fn apply(&mut self, desired: BootOrder, password: Password) -> BootResult<Option<Completed>> {
        self.begin_apply(desired)?
            .map(|job| self.run_now(job, password))
            .transpose()
    }

    /// Boots an entry once on the next boot, blocking until the command is done.
    ///
    /// # Errors
    ///
    /// May return an `Error` if a job is already out, if the entry does not exist, or if the command failed.
    pub fn set_boot_next(&mut self, id: BootId, password: Password) -> BootResult<Completed> {
        let job = self.begin_set_next(id)?;
        self.run_now(job, password)
    }

    /// Removes the one-time boot target, blocking until the command is done.
    ///
    /// Returns [`None`] if no target was set.
    ///
    /// # Errors
    ///
    /// May return an `Error` if a job is already out, or if the command failed.
    pub fn clear_boot_next(&mut self, password: Password) -> BootResult<Option<Completed>> {
        self.begin_clear_next()?
            .map(|job| self.run_now(job, password))
            .transpose()
    }

    /// Marks the session as busy with an action and packages it into a [`Job`].
    fn start(&mut self, action: BootAction) -> Job {
        let invocation = action.invocation(&self.config);
        self.in_flight = Some(action.clone());
        Job { action, invocation }
    }

    /// Runs a job with the executor of the session and finishes it.
    fn run_now(&mut self, job: Job, password: Password) -> BootResult<Completed> {
        let result = job.run(&*self.executor, password);
        self.finish(result)
    }

    /// Fails with [`BootError::Busy`] if a job is out.
    const fn ensure_idle(&self) -> BootResult<()> {
        if self.busy() {
            Err(BootError::Busy)
        } else {
            Ok(())
        }
    }

    /// Fails if a job is out, or if the table has to be reloaded first.
    const fn ensure_ready(&self) -> BootResult<()> {
        if self.busy() {
            Err(BootError::Busy)
        } else if self.stale {
            Err(BootError::ReloadRequired)
        } else {
            Ok(())
        }
    }
}

/// Reads and parses the listing of a source.
fn load_table(listing: &dyn ListingSource) -> BootResult<BootTable> {
    let text = listing.read_listing()?;
    BootTable::parse(&text).map_err(|e| {
        warn!("Could not parse boot table: {e}");
        e.into()
    })
}

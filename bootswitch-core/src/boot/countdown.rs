// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! A cancellable countdown before rebooting.
//!
//! The [`Countdown`] is a plain state machine driven by [`Countdown::tick`]; it never reads a clock by itself, so
//! whoever owns it decides what one tick means. A [`RebootDispatch`] is only ever created by the tick that reaches
//! zero, and it is the only way to run the reboot command, so a cancelled countdown can never reboot the machine.

use log::{debug, info};
use thiserror::Error;

use crate::{
    BootResult,
    boot::{action::BootAction, config::BootConfig},
    system::{
        exec::{ExecOutput, Executor},
        secret::Password,
    },
};

/// The amount of ticks between arming the countdown and rebooting.
pub const REBOOT_COUNTDOWN_SECS: u32 = 5;

/// Errors that may result from using a [`Countdown`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CountdownError {
    /// The countdown was already armed once.
    #[error("The countdown is not idle")]
    NotIdle,
}

/// The state of a [`Countdown`].
#[derive(Debug, Default)]
pub enum CountdownState {
    /// Not armed yet.
    #[default]
    Idle,

    /// Counting down towards running an action.
    Counting {
        /// The ticks left until the action runs.
        remaining: u32,
        /// The action that runs when the countdown expires.
        action: BootAction,
        /// The password that authorizes the action.
        password: Password,
    },

    /// Cancelled before it expired.
    Cancelled,

    /// Expired, and the action was handed out.
    Fired,
}

/// A countdown that reboots the machine unless it is cancelled.
#[derive(Debug, Default)]
pub struct Countdown {
    /// The current state.
    state: CountdownState,
}

impl Countdown {
    /// Creates a new, idle [`Countdown`].
    #[must_use = "Has no effect if the result is unused"]
    pub const fn new() -> Self {
        Self {
            state: CountdownState::Idle,
        }
    }

    /// Starts counting down from [`REBOOT_COUNTDOWN_SECS`].
    ///
    /// The password is held until the countdown either fires or is cancelled.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the countdown is not idle.
    pub fn arm(&mut self, password: Password) -> Result<(), CountdownError> {
        if !matches!(self.state, CountdownState::Idle) {
            return Err(CountdownError::NotIdle);
        }

        info!("Rebooting in {REBOOT_COUNTDOWN_SECS} seconds");
        self.state = CountdownState::Counting {
            remaining: REBOOT_COUNTDOWN_SECS,
            action: BootAction::Reboot,
            password,
        };
        Ok(())
    }

    /// Advances the countdown by one tick.
    ///
    /// Returns the [`RebootDispatch`] on the tick that reaches zero, and [`None`] on every other tick. Ticks outside
    /// of counting do nothing.
    pub fn tick(&mut self) -> Option<RebootDispatch> {
        let CountdownState::Counting { remaining, .. } = &mut self.state else {
            return None;
        };

        *remaining = remaining.saturating_sub(1);
        if *remaining > 0 {
            return None;
        }

        match std::mem::replace(&mut self.state, CountdownState::Fired) {
            CountdownState::Counting {
                action, password, ..
            } => {
                info!("Countdown expired");
                Some(RebootDispatch { action, password })
            }
            _ => None,
        }
    }

    /// Cancels the countdown, dropping the held password.
    ///
    /// Returns whether anything was cancelled. After the countdown fired or was cancelled, this does nothing.
    pub fn cancel(&mut self) -> bool {
        if !matches!(self.state, CountdownState::Counting { .. }) {
            return false;
        }

        debug!("Countdown cancelled");
        self.state = CountdownState::Cancelled;
        true
    }

    /// Returns the ticks left, if the countdown is counting.
    #[must_use = "Has no effect if the result is unused"]
    pub const fn remaining(&self) -> Option<u32> {
        match &self.state {
            CountdownState::Counting { remaining, .. } => Some(*remaining),
            _ => None,
        }
    }

    /// Checks if the countdown is counting.
    #[must_use = "Has no effect if the result is unused"]
    pub const fn is_counting(&self) -> bool {
        matches!(self.state, CountdownState::Counting { .. })
    }

    /// Returns the current [`CountdownState`].
    #[must_use = "Has no effect if the result is unused"]
    pub const fn state(&self) -> &CountdownState {
        &self.state
    }
}

/// The reboot handed out by an expired [`Countdown`].
///
/// This can not be constructed outside of a [`Countdown`].
#[derive(Debug)]
pub struct RebootDispatch {
    /// The action to run.
    action: BootAction,

    /// The password that authorizes the action.
    password: Password,
}

impl RebootDispatch {
    /// Runs the reboot command through an executor.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the executor fails to run the command.
    pub fn run(self, executor: &dyn Executor, config: &BootConfig) -> BootResult<ExecOutput> {
        let invocation = self.action.invocation(config);
        info!("Dispatching {}", self.action);
        Ok(executor.run(&invocation, self.password)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::system::exec::{ExecError, Invocation};

    /// Records every invocation it is asked to run.
    #[derive(Default)]
    struct Recorder(Mutex<Vec<(Invocation, String)>>);

    impl Executor for Recorder {
        fn run(&self, invocation: &Invocation, password: Password) -> Result<ExecOutput, ExecError> {
            if let Ok(mut runs) = self.0.lock() {
                runs.push((invocation.clone(), password.expose().to_owned()));
            }
            Ok(ExecOutput::default())
        }
    }

    fn armed() -> Countdown {
        let mut countdown = Countdown::new();
        countdown
            .arm(Password::from("secret"))
            .expect("a new countdown is idle");
        countdown
    }

    #[test]
    fn test_fires_after_all_ticks() {
        let mut countdown = armed();
        assert_eq!(countdown.remaining(), Some(REBOOT_COUNTDOWN_SECS));

        for left in (1..REBOOT_COUNTDOWN_SECS).rev() {
            assert!(countdown.tick().is_none());
            assert_eq!(countdown.remaining(), Some(left));
        }

        let dispatch = countdown.tick().expect("the last tick should fire");
        assert!(matches!(countdown.state(), CountdownState::Fired));

        let recorder = Recorder::default();
        dispatch
            .run(&recorder, &BootConfig::default())
            .expect("recorder never fails");
        let runs = recorder.0.lock().expect("lock is not poisoned");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].0, Invocation::new("systemctl", ["reboot"]));
        assert_eq!(runs[0].1, "secret");
    }

    #[test]
    fn test_cancel_before_final_tick() {
        let mut countdown = armed();
        for _ in 1..REBOOT_COUNTDOWN_SECS {
            assert!(countdown.tick().is_none());
        }

        assert!(countdown.cancel());
        assert!(matches!(countdown.state(), CountdownState::Cancelled));

        // late ticks never fire
        for _ in 0..REBOOT_COUNTDOWN_SECS * 2 {
            assert!(countdown.tick().is_none());
        }
        assert!(!countdown.cancel());
    }

    #[test]
    fn test_cancel_after_fired() {
        let mut countdown = armed();
        let mut dispatches = 0;
        for _ in 0..REBOOT_COUNTDOWN_SECS * 2 {
            if countdown.tick().is_some() {
                dispatches += 1;
            }
        }
        assert_eq!(dispatches, 1);
        assert!(!countdown.cancel());
        assert!(matches!(countdown.state(), CountdownState::Fired));
    }

    #[test]
    fn test_arm_twice() {
        let mut countdown = armed();
        assert_eq!(countdown.arm(Password::new()), Err(CountdownError::NotIdle));

        countdown.cancel();
        assert_eq!(countdown.arm(Password::new()), Err(CountdownError::NotIdle));
    }

    #[test]
    fn test_idle_ticks() {
        let mut countdown = Countdown::new();
        assert!(countdown.tick().is_none());
        assert!(!countdown.cancel());
        assert!(!countdown.is_counting());
    }
}

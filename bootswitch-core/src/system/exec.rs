// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! Running commands with elevated privileges.
//!
//! Anything that writes to the firmware (or reboots the machine) goes through an [`Executor`]. The default one is
//! [`SudoExecutor`], which hands the password to `sudo` on its standard input, so that it never shows up in a
//! process listing, and reports back one of a small set of failure kinds that the frontend can act on.

use std::{
    fmt,
    io::{self, Read, Write},
    process::{Child, ChildStderr, ChildStdout, Command, ExitStatus, Stdio},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{debug, error, info, warn};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::{boot::config::BootConfig, system::secret::Password};

/// The arguments passed to `sudo` before the command.
///
/// `-S` reads the password from stdin, `-k` ignores any cached credentials so that the password is always checked,
/// and `-p ""` silences the prompt.
const SUDO_ARGS: [&str; 4] = ["-S", "-k", "-p", ""];

/// How often a running child is checked for having exited.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How long a timed out command gets to stop after being asked to.
const TERM_GRACE: Duration = Duration::from_secs(2);

/// Messages from `sudo` meaning the credential was rejected.
const PASSWORD_REJECTED: [&str; 3] = [
    "incorrect password",
    "Sorry, try again",
    "no password was provided",
];

/// The message from `sudo` or a shell when the command does not exist.
const COMMAND_NOT_FOUND: &str = "command not found";

/// An `Error` that may result from running a command.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The elevation program rejected the password.
    #[error("Incorrect password")]
    IncorrectPassword,

    /// The elevation program or the command itself does not exist.
    #[error("\"{0}\" was not found")]
    ToolNotFound(String),

    /// The command ran, but reported a failure.
    #[error("Command failed with exit code {}: {stderr}", .code.map_or_else(|| "none".to_owned(), |c| c.to_string()))]
    NonZeroExit {
        /// The exit code, if the command was not killed by a signal.
        code: Option<i32>,
        /// What the command printed to stderr.
        stderr: String,
    },

    /// The command did not finish in time and was stopped.
    #[error("Command did not finish within {} seconds", .0.as_secs())]
    Timeout(Duration),

    /// The command did not finish in time and ignored the request to stop.
    ///
    /// The elevation program was killed, but the command it started may still be running, so the firmware may
    /// change at any point afterwards.
    #[error("Command did not stop after {} seconds, its outcome is unknown", .0.as_secs())]
    Abandoned(Duration),

    /// The command could not be started or talked to.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
}

/// A command line, without any elevation program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    /// The program to run.
    pub program: String,

    /// The arguments to the program.
    pub args: Vec<String>,
}

impl Invocation {
    /// Creates a new [`Invocation`].
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// The captured output of a command that succeeded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecOutput {
    /// What the command printed to stdout.
    pub stdout: String,

    /// What the command printed to stderr.
    pub stderr: String,
}

/// Runs commands with elevated privileges.
///
/// An implementation must never keep the [`Password`] past the end of [`Executor::run`], and never put it into its
/// output or errors.
pub trait Executor: Send + Sync {
    /// Runs an [`Invocation`] with elevated privileges, authorized by a password.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the password was rejected, the command does not exist, the command failed, or the
    /// command did not finish in time.
    fn run(&self, invocation: &Invocation, password: Password) -> Result<ExecOutput, ExecError>;
}

/// An [`Executor`] that elevates through `sudo`.
#[derive(Clone, Debug)]
pub struct SudoExecutor {
    /// The elevation program.
    program: String,

    /// The arguments to the elevation program, placed before the command.
    args: Vec<String>,

    /// How long a command may take before it is killed.
    timeout: Duration,
}

impl SudoExecutor {
    /// Creates a new [`SudoExecutor`] from a [`BootConfig`].
    #[must_use = "Has no effect if the result is unused"]
    pub fn new(config: &BootConfig) -> Self {
        Self::with_program(config.sudo.clone(), SUDO_ARGS, config.exec_timeout)
    }

    /// Creates a new [`SudoExecutor`] with a custom elevation program and arguments.
    ///
    /// The password is always written to the standard input of the program, followed by a newline.
    pub fn with_program<I, S>(program: impl Into<String>, args: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout,
        }
    }
}

impl Executor for SudoExecutor {
    fn run(&self, invocation: &Invocation, password: Password) -> Result<ExecOutput, ExecError> {
        info!("Running \"{invocation}\" through {}", self.program);

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("--")
            .arg(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // a group of its own, so that a timeout reaches everything the elevation program started
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut command, 0);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ExecError::ToolNotFound(self.program.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        // if the child exits without reading stdin, the write fails with a broken pipe. the exit status will tell
        // what happened.
        if let Err(e) = write_secret(&mut child, password) {
            debug!("Could not write password to {}: {e}", self.program);
        }

        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        // on a timeout the readers are left behind, as a grandchild could keep the pipes open for a while longer
        let status = match wait_timeout(&mut child, self.timeout)? {
            Exit::Finished(status) => status,
            Exit::Stopped => {
                warn!("\"{invocation}\" timed out after {:?}", self.timeout);
                return Err(ExecError::Timeout(self.timeout));
            }
            Exit::Killed => {
                error!("\"{invocation}\" timed out after {:?} and did not stop", self.timeout);
                return Err(ExecError::Abandoned(self.timeout));
            }
        };

        let output = ExecOutput {
            stdout: join_reader(stdout),
            stderr: join_reader(stderr),
        };

        classify(status, output, invocation)
    }
}

/// Writes a [`Password`] followed by a newline into the stdin of a child, then closes it.
///
/// The password is consumed, and the buffer holding the line is zeroed once it was written.
fn write_secret(child: &mut Child, password: Password) -> io::Result<()> {
    let Some(mut stdin) = child.stdin.take() else {
        return Ok(());
    };

    let mut line = Zeroizing::new(Vec::with_capacity(password.expose().len() + 1));
    line.extend_from_slice(password.expose().as_bytes());
    line.push(b'\n');
    drop(password);

    stdin.write_all(&line)?;
    stdin.flush()
}

/// Either end of a child's output.
trait OutputPipe: Read + Send + 'static {}

impl OutputPipe for ChildStdout {}
impl OutputPipe for ChildStderr {}

/// Reads a pipe to its end on a separate thread, so that a chatty child never blocks on a full pipe.
fn spawn_reader<P: OutputPipe>(pipe: Option<P>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

/// Waits for a reader thread to finish and returns what it read.
fn join_reader(reader: Option<JoinHandle<String>>) -> String {
    reader
        .and_then(|reader| reader.join().ok())
        .unwrap_or_default()
}

/// How a child that was waited on ended.
enum Exit {
    /// It exited on its own.
    Finished(ExitStatus),

    /// It timed out, then exited when asked to stop.
    Stopped,

    /// It timed out and ignored the request to stop, so it was killed.
    Killed,
}

/// Waits for a child to exit, stopping it if it takes longer than the timeout.
///
/// A timed out child is first asked to stop with `SIGTERM`, which `sudo` passes on to the command it runs. Only if
/// it is still there after [`TERM_GRACE`] is it killed. `SIGKILL` can not be passed on, and the command runs as
/// another user, so after a kill nothing is known about the command.
fn wait_timeout(child: &mut Child, timeout: Duration) -> io::Result<Exit> {
    if let Some(status) = wait_until(child, Instant::now() + timeout)? {
        return Ok(Exit::Finished(status));
    }

    request_stop(child);
    if wait_until(child, Instant::now() + TERM_GRACE)?.is_some() {
        return Ok(Exit::Stopped);
    }

    force_stop(child);
    let _ = child.wait();
    Ok(Exit::Killed)
}

/// Polls a child until it exits or the deadline passes.
fn wait_until(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Sends `SIGTERM` to the process group of a child.
#[cfg(unix)]
fn request_stop(child: &Child) {
    signal_group(child, libc::SIGTERM);
}

/// Kills the process group of a child, or at least the child itself.
#[cfg(unix)]
fn force_stop(child: &mut Child) {
    if !signal_group(child, libc::SIGKILL)
        && let Err(e) = child.kill()
    {
        debug!("Could not kill timed out child: {e}");
    }
}

/// Sends a signal to the process group led by a child that has not been waited on yet.
///
/// Members running as another user (such as the command under `sudo`) are skipped by the kernel. Returns whether
/// the signal reached anything.
#[cfg(unix)]
fn signal_group(child: &Child, signal: libc::c_int) -> bool {
    let Ok(pid) = libc::pid_t::try_from(child.id()) else {
        return false;
    };

    // SAFETY: kill(2) only sends a signal. The child has not been reaped, so the group id still belongs to it.
    let sent = unsafe { libc::kill(-pid, signal) } == 0;
    if !sent {
        debug!(
            "Could not signal process group {pid}: {}",
            io::Error::last_os_error()
        );
    }
    sent
}

/// Asks a child to stop. Without signals there is no way to ask, so this waits out the grace period.
#[cfg(not(unix))]
fn request_stop(_child: &Child) {}

/// Kills a child.
#[cfg(not(unix))]
fn force_stop(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!("Could not kill timed out child: {e}");
    }
}

/// Turns the exit status and output of a finished child into a result.
fn classify(
    status: ExitStatus,
    output: ExecOutput,
    invocation: &Invocation,
) -> Result<ExecOutput, ExecError> {
    if status.success() {
        return Ok(output);
    }

    if PASSWORD_REJECTED
        .iter()
        .any(|message| output.stderr.contains(message))
    {
        return Err(ExecError::IncorrectPassword);
    }

    if output.stderr.contains(COMMAND_NOT_FOUND) {
        return Err(ExecError::ToolNotFound(invocation.program.clone()));
    }

    Err(ExecError::NonZeroExit {
        code: status.code(),
        stderr: output.stderr.trim().to_owned(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// An executor that runs a shell script in place of `sudo`. The script sees the command as `$1 $2 ...`.
    fn shell(script: &str, timeout: Duration) -> SudoExecutor {
        let script = format!("shift; {script}"); // drop the -- separator
        SudoExecutor::with_program("sh", ["-c".to_owned(), script, "sh".to_owned()], timeout)
    }

    fn echo() -> Invocation {
        Invocation::new("echo", ["hello"])
    }

    #[test]
    fn test_success_runs_command() {
        let executor = shell("read -r pw; \"$@\"", Duration::from_secs(10));
        let output = executor
            .run(&echo(), Password::from("secret"))
            .expect("command should succeed");
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[test]
    fn test_password_not_in_output() {
        let executor = shell(
            "read -r pw; [ \"$pw\" = hunter2 ] && echo accepted",
            Duration::from_secs(10),
        );
        let output = executor
            .run(&echo(), Password::from("hunter2"))
            .expect("command should succeed");
        assert_eq!(output.stdout.trim(), "accepted");
        assert!(!output.stdout.contains("hunter2"));
        assert!(!output.stderr.contains("hunter2"));
        assert!(!format!("{executor:?}").contains("hunter2"));
    }

    #[test]
    fn test_incorrect_password() {
        let executor = shell(
            "read -r pw; echo 'Sorry, try again.' >&2; echo 'sudo: 1 incorrect password attempt' >&2; exit 1",
            Duration::from_secs(10),
        );
        let result = executor.run(&echo(), Password::from("wrong"));
        assert!(matches!(result, Err(ExecError::IncorrectPassword)));
    }

    #[test]
    fn test_command_not_found() {
        let executor = shell(
            "read -r pw; echo \"sudo: $1: command not found\" >&2; exit 1",
            Duration::from_secs(10),
        );
        let result = executor.run(&Invocation::new("efibootmgr", ["-o", "0001"]), Password::new());
        assert!(matches!(result, Err(ExecError::ToolNotFound(tool)) if tool == "efibootmgr"));
    }

    #[test]
    fn test_missing_elevation_program() {
        let executor = SudoExecutor::with_program(
            "/nonexistent/bootswitch-sudo",
            SUDO_ARGS,
            Duration::from_secs(10),
        );
        let result = executor.run(&echo(), Password::from("secret"));
        assert!(
            matches!(result, Err(ExecError::ToolNotFound(tool)) if tool == "/nonexistent/bootswitch-sudo")
        );
    }

    #[test]
    fn test_non_zero_exit() {
        let executor = shell(
            "read -r pw; echo 'Could not set BootOrder' >&2; exit 3",
            Duration::from_secs(10),
        );
        let result = executor.run(&echo(), Password::from("secret"));
        match result {
            Err(ExecError::NonZeroExit { code, stderr }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "Could not set BootOrder");
            }
            other => panic!("expected NonZeroExit, got {other:?}"),
        }
    }

    #[test]
    fn test_timeout() {
        let executor = shell("exec sleep 5", Duration::from_millis(100));
        let start = Instant::now();
        let result = executor.run(&echo(), Password::from("secret"));
        assert!(matches!(result, Err(ExecError::Timeout(_))));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_timeout_stops_started_commands() {
        let marker = std::env::temp_dir().join(format!("bootswitch-exec-{}", std::process::id()));
        let _ = std::fs::remove_file(&marker);

        // the command forks like sudo does, and would leave a trace after the timeout
        let executor = shell(
            &format!(
                "read -r pw; sh -c 'sleep 1; touch \"$0\"' '{}'; true",
                marker.display()
            ),
            Duration::from_millis(200),
        );
        let result = executor.run(&echo(), Password::from("secret"));
        assert!(matches!(result, Err(ExecError::Timeout(_))));

        thread::sleep(Duration::from_millis(1500));
        let leftover = marker.exists();
        let _ = std::fs::remove_file(&marker);
        assert!(!leftover, "command kept running after the timeout");
    }

    #[test]
    fn test_ignored_stop_is_abandoned() {
        let executor = shell("trap '' TERM; sleep 5", Duration::from_millis(100));
        let start = Instant::now();
        let result = executor.run(&echo(), Password::from("secret"));
        assert!(matches!(result, Err(ExecError::Abandoned(_))));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_invocation_display() {
        let invocation = Invocation::new("efibootmgr", ["-o", "0003,0001"]);
        assert_eq!(invocation.to_string(), "efibootmgr -o 0003,0001");
    }
}

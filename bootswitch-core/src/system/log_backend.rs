// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! Simple file backend for the [`log`] crate.
//!
//! While a terminal frontend owns the screen, anything written to stdout or stderr would tear up the UI. Records are
//! therefore either appended to a log file, or held in memory until the frontend gives the terminal back and calls
//! [`FileLogger::take_buffered`].

use std::{
    collections::VecDeque,
    fs::{File, OpenOptions},
    io::{self, Write},
    path::Path,
    sync::Mutex,
    time::{SystemTime, UNIX_EPOCH},
};

use log::{Metadata, Record};

/// The maximum amount of records held in memory. Older records are dropped first.
const BUFFER_LEN: usize = 256;

/// Where the records go.
enum Sink {
    /// Records are held in memory.
    Buffer(VecDeque<String>),

    /// Records are appended to a file.
    File(File),
}

/// A simple logging backend writing to a file or to memory.
pub struct FileLogger {
    /// The current destination of records.
    sink: Mutex<Sink>,
}

impl FileLogger {
    /// Constructs a new [`FileLogger`] that holds records in memory.
    #[must_use = "Has no effect if the result is unused"]
    pub const fn new() -> Self {
        Self {
            sink: Mutex::new(Sink::Buffer(VecDeque::new())),
        }
    }

    /// Switches the [`FileLogger`] over to appending to a file.
    ///
    /// Records that were held in memory so far are written to the file first.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the file could not be opened or written to. The logger keeps buffering in that case.
    pub fn log_to_file(&self, path: &Path) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let Ok(mut sink) = self.sink.lock() else {
            return Ok(());
        };

        if let Sink::Buffer(buffer) = &*sink {
            for line in buffer {
                writeln!(file, "{line}")?;
            }
        }
        *sink = Sink::File(file);
        Ok(())
    }

    /// Takes every record held in memory.
    ///
    /// Returns an empty [`Vec`] if the logger writes to a file.
    #[must_use = "Has no effect if the result is unused"]
    pub fn take_buffered(&self) -> Vec<String> {
        match self.sink.lock().as_deref_mut() {
            Ok(Sink::Buffer(buffer)) => buffer.drain(..).collect(),
            _ => Vec::new(),
        }
    }
}

impl Default for FileLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let level = record.level();
        let file = record.file().unwrap_or_default();
        let line = record.line().unwrap_or_default();
        let args = record.args();
        let record = format!("[{time} {level} {file}:{line}] - {args}");

        let Ok(mut sink) = self.sink.lock() else {
            return;
        };
        match &mut *sink {
            Sink::Buffer(buffer) => {
                if buffer.len() == BUFFER_LEN {
                    buffer.pop_front();
                }
                buffer.push_back(record);
            }
            Sink::File(file) => {
                let _ = writeln!(file, "{record}");
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut sink) = self.sink.lock()
            && let Sink::File(file) = &mut *sink
        {
            let _ = file.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use log::{Level, Log};

    use super::*;

    fn record(logger: &FileLogger, message: &str) {
        logger.log(
            &Record::builder()
                .args(format_args!("{message}"))
                .level(Level::Error)
                .file(Some("exec.rs"))
                .line(Some(7))
                .build(),
        );
    }

    #[test]
    fn test_buffered() {
        let logger = FileLogger::new();
        record(&logger, "first");
        record(&logger, "second");

        let lines = logger.take_buffered();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("ERROR exec.rs:7] - first"));
        assert!(logger.take_buffered().is_empty());
    }

    #[test]
    fn test_buffer_is_bounded() {
        let logger = FileLogger::new();
        for i in 0..BUFFER_LEN + 5 {
            record(&logger, &i.to_string());
        }
        let lines = logger.take_buffered();
        assert_eq!(lines.len(), BUFFER_LEN);
        assert!(lines[0].ends_with("- 5"));
    }

    #[test]
    fn test_log_to_file() {
        let path = std::env::temp_dir().join(format!("bootswitch-log-{}.log", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let logger = FileLogger::new();
        record(&logger, "before");
        logger.log_to_file(&path).expect("temp file should open");
        record(&logger, "after");
        logger.flush();

        let content = std::fs::read_to_string(&path).expect("log file should exist");
        let _ = std::fs::remove_file(&path);
        assert!(content.contains("- before"));
        assert!(content.contains("- after"));
        assert!(logger.take_buffered().is_empty());
    }
}

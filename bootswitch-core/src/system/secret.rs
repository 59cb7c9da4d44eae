// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! Provides [`Password`], an interactively captured secret.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// The maximum length of a [`Password`] in bytes.
///
/// The buffer is allocated once with this capacity, so typing a password never reallocates and never leaves an old
/// copy of it behind in freed memory.
pub const MAX_PASSWORD_LEN: usize = 256;

/// A password typed in by the operator.
///
/// The memory is zeroed when the [`Password`] is dropped, and its [`fmt::Debug`] implementation never prints it.
/// Handing a [`Password`] to an executor consumes it.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Password(String);

impl Password {
    /// Creates a new, empty [`Password`].
    #[must_use = "Has no effect if the result is unused"]
    pub fn new() -> Self {
        Self(String::with_capacity(MAX_PASSWORD_LEN))
    }

    /// Appends a character. Returns `false` if the character would not fit.
    pub fn push(&mut self, c: char) -> bool {
        if self.0.len() + c.len_utf8() > MAX_PASSWORD_LEN {
            return false;
        }
        self.0.push(c);
        true
    }

    /// Removes the last character. Returns `false` if the password was already empty.
    pub fn pop(&mut self) -> bool {
        self.0.pop().is_some()
    }

    /// Zeroes the [`Password`], leaving it empty.
    pub fn clear(&mut self) {
        self.0.zeroize();
        self.0.reserve(MAX_PASSWORD_LEN);
    }

    /// Returns the amount of characters in the [`Password`].
    #[must_use = "Has no effect if the result is unused"]
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Checks if the [`Password`] is empty.
    #[must_use = "Has no effect if the result is unused"]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the secret itself.
    ///
    /// Only an executor handing the secret to the elevation program, or a frontend that was explicitly asked to
    /// show it, should ever need this.
    #[must_use = "Has no effect if the result is unused"]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Default for Password {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Password {
    fn clone(&self) -> Self {
        let mut password = Self::new();
        password.0.push_str(&self.0);
        password
    }
}

impl From<&str> for Password {
    fn from(value: &str) -> Self {
        let mut password = Self::new();
        for c in value.chars() {
            if !password.push(c) {
                break;
            }
        }
        password
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let password = Password::from("hunter2");
        assert!(!format!("{password:?}").contains("hunter2"));
    }

    #[test]
    fn test_push_pop() {
        let mut password = Password::new();
        assert!(password.push('a'));
        assert!(password.push('ß'));
        assert_eq!(password.len(), 2);
        assert!(password.pop());
        assert_eq!(password.expose(), "a");
        password.clear();
        assert!(password.is_empty());
        assert!(!password.pop());
    }

    #[test]
    fn test_capacity_is_bounded() {
        let long = "x".repeat(MAX_PASSWORD_LEN + 10);
        let mut password = Password::from(long.as_str());
        assert_eq!(password.len(), MAX_PASSWORD_LEN);
        assert!(!password.push('y'));
    }
}

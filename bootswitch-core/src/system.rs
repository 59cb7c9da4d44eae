// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! Everything that touches the running system: processes, secrets, and logging.

pub mod exec;
pub mod listing;
pub mod log_backend;
pub mod secret;

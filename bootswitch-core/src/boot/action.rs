// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! Provides [`BootAction`], a description of one privileged command.

use std::fmt;

use crate::{
    boot::config::BootConfig,
    system::exec::Invocation,
    table::types::{BootId, BootOrder},
};

/// Something that needs to be done to the firmware or the machine.
///
/// A [`BootAction`] only describes the change; it is turned into an [`Invocation`] for an executor to run.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BootAction {
    /// Replace the persistent boot order with a complete new one.
    SetOrder(BootOrder),

    /// Boot an entry once on the next boot.
    SetNext(BootId),

    /// Remove the one-time boot target.
    ClearNext,

    /// Reboot the machine.
    Reboot,
}

impl BootAction {
    /// Builds the command line for this action given a config.
    #[must_use = "Has no effect if the result is unused"]
    pub fn invocation(&self, config: &BootConfig) -> Invocation {
        match self {
            Self::SetOrder(order) => {
                Invocation::new(&*config.efibootmgr, ["-o".to_owned(), order.to_string()])
            }
            Self::SetNext(id) => Invocation::new(&*config.efibootmgr, ["-n".to_owned(), id.to_string()]),
            Self::ClearNext => Invocation::new(&*config.efibootmgr, ["-N"]),
            Self::Reboot => {
                let (program, args) = config
                    .reboot
                    .split_first()
                    .map_or(("reboot", &[][..]), |(program, args)| (program.as_str(), args));
                Invocation::new(program, args.iter().cloned())
            }
        }
    }

    /// Checks if the action writes the persistent boot order.
    #[must_use = "Has no effect if the result is unused"]
    pub const fn changes_order(&self) -> bool {
        matches!(self, Self::SetOrder(_))
    }
}

impl fmt::Display for BootAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetOrder(order) => write!(f, "set boot order to {order}"),
            Self::SetNext(id) => write!(f, "boot {id} once"),
            Self::ClearNext => f.write_str("clear one-time boot"),
            Self::Reboot => f.write_str("reboot"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(ids: &[u16]) -> BootOrder {
        ids.iter().copied().map(BootId::new).collect()
    }

    #[test]
    fn test_invocations() {
        let config = BootConfig::default();

        let set = BootAction::SetOrder(order(&[3, 1, 2])).invocation(&config);
        assert_eq!(set.to_string(), "efibootmgr -o 0003,0001,0002");

        let next = BootAction::SetNext(BootId::new(0x1a)).invocation(&config);
        assert_eq!(next.to_string(), "efibootmgr -n 001A");

        let clear = BootAction::ClearNext.invocation(&config);
        assert_eq!(clear.to_string(), "efibootmgr -N");

        let reboot = BootAction::Reboot.invocation(&config);
        assert_eq!(reboot, Invocation::new("systemctl", ["reboot"]));
    }

    #[test]
    fn test_custom_tools() {
        let config = BootConfig::get_boot_config("efibootmgr /sbin/efibootmgr\nreboot /sbin/reboot\n");
        assert_eq!(
            BootAction::ClearNext.invocation(&config).program,
            "/sbin/efibootmgr"
        );
        assert_eq!(
            BootAction::Reboot.invocation(&config),
            Invocation::new("/sbin/reboot", Vec::<String>::new())
        );
    }
}

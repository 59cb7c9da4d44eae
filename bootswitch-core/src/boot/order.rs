// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! Reordering the persistent boot order.
//!
//! The firmware tool always replaces the whole order at once, so every operation here works on complete
//! [`BootOrder`]s and never on partial edits.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::{
    boot::action::BootAction,
    table::types::{BootId, BootOrder},
};

/// Errors that may result from working with a [`BootOrder`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OrderError {
    /// The entry is not part of the order.
    #[error("Boot{0} is not in the boot order")]
    UnknownId(BootId),

    /// The desired order adds, drops, or repeats an entry of the current order.
    #[error("\"{desired}\" is not a permutation of \"{current}\"")]
    NotPermutation {
        /// The order of the firmware.
        current: BootOrder,
        /// The order that was about to be written.
        desired: BootOrder,
    },
}

/// The direction an entry is moved in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Towards the front of the order, meaning a higher priority.
    Up,

    /// Towards the back of the order, meaning a lower priority.
    Down,
}

/// The difference between two orders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderDiff {
    /// Nothing needs to be written.
    Unchanged,

    /// The complete order to write.
    Replace(BootOrder),
}

impl OrderDiff {
    /// Turns the difference into the [`BootAction`] that persists it, if anything needs to be written.
    #[must_use = "Has no effect if the result is unused"]
    pub fn into_action(self) -> Option<BootAction> {
        match self {
            Self::Unchanged => None,
            Self::Replace(order) => Some(BootAction::SetOrder(order)),
        }
    }
}

/// Moves an entry one place up or down, swapping it with its neighbour.
///
/// Moving the first entry up or the last entry down returns the order unchanged.
///
/// # Errors
///
/// May return an `Error` if the entry is not in the order.
pub fn move_entry(
    order: &BootOrder,
    id: BootId,
    direction: Direction,
) -> Result<BootOrder, OrderError> {
    let pos = order.position(id).ok_or(OrderError::UnknownId(id))?;
    let mut order = order.clone();

    let neighbour = match direction {
        Direction::Up => pos.checked_sub(1),
        Direction::Down => Some(pos + 1).filter(|&next| next < order.len()),
    };
    if let Some(neighbour) = neighbour {
        order.swap(pos, neighbour);
    }

    Ok(order)
}

/// Compares the current order with a desired one.
#[must_use = "Has no effect if the result is unused"]
pub fn diff(current: &BootOrder, desired: &BootOrder) -> OrderDiff {
    if current == desired {
        OrderDiff::Unchanged
    } else {
        OrderDiff::Replace(desired.clone())
    }
}

/// Checks that the desired order holds exactly the entries of the current order, each exactly once.
///
/// # Errors
///
/// May return an `Error` if the desired order adds, drops, or duplicates an entry.
pub fn check_permutation(current: &BootOrder, desired: &BootOrder) -> Result<(), OrderError> {
    let unique: BTreeSet<_> = desired.iter().collect();
    let same_set = unique.len() == desired.len()
        && current.len() == desired.len()
        && current.iter().all(|id| unique.contains(id));

    if same_set {
        Ok(())
    } else {
        Err(OrderError::NotPermutation {
            current: current.clone(),
            desired: desired.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn order(ids: &[u16]) -> BootOrder {
        ids.iter().copied().map(BootId::new).collect()
    }

    #[test]
    fn test_move_up_and_down() {
        let current = order(&[1, 2, 3]);
        let moved = move_entry(&current, BootId::new(3), Direction::Up).expect("0003 is in the order");
        assert_eq!(moved, order(&[1, 3, 2]));

        let moved = move_entry(&moved, BootId::new(1), Direction::Down).expect("0001 is in the order");
        assert_eq!(moved, order(&[3, 1, 2]));
    }

    #[test]
    fn test_boundaries_are_no_ops() {
        let current = order(&[1, 2, 3]);
        assert_eq!(
            move_entry(&current, BootId::new(1), Direction::Up),
            Ok(current.clone())
        );
        assert_eq!(
            move_entry(&current, BootId::new(3), Direction::Down),
            Ok(current.clone())
        );

        let single = order(&[7]);
        assert_eq!(
            move_entry(&single, BootId::new(7), Direction::Down),
            Ok(single.clone())
        );
    }

    #[test]
    fn test_unknown_id() {
        let current = order(&[1, 2]);
        assert_eq!(
            move_entry(&current, BootId::new(9), Direction::Up),
            Err(OrderError::UnknownId(BootId::new(9)))
        );
    }

    #[test]
    fn test_diff() {
        let current = order(&[1, 2, 3]);
        assert_eq!(diff(&current, &current), OrderDiff::Unchanged);
        assert_eq!(diff(&current, &current).into_action(), None);

        let desired = order(&[3, 1, 2]);
        assert_eq!(
            diff(&current, &desired).into_action(),
            Some(BootAction::SetOrder(desired))
        );
    }

    #[test]
    fn test_check_permutation() {
        let current = order(&[1, 2, 3]);
        assert!(check_permutation(&current, &order(&[3, 2, 1])).is_ok());
        assert!(check_permutation(&current, &order(&[1, 2])).is_err());
        assert!(check_permutation(&current, &order(&[1, 2, 3, 4])).is_err());
        assert!(check_permutation(&current, &order(&[1, 1, 2])).is_err());
        assert!(check_permutation(&current, &order(&[1, 2, 4])).is_err());
        assert!(check_permutation(&order(&[]), &order(&[])).is_ok());
    }

    proptest! {
        #[test]
        fn moves_keep_permutation(
            ids in proptest::collection::btree_set(any::<u16>(), 1..12),
            moves in proptest::collection::vec((any::<prop::sample::Index>(), any::<bool>()), 0..32),
        ) {
            let current: BootOrder = ids.into_iter().map(BootId::new).collect();
            let mut desired = current.clone();

            for (index, up) in moves {
                let id = desired[index.index(desired.len())];
                let direction = if up { Direction::Up } else { Direction::Down };
                desired = move_entry(&desired, id, direction).expect("id was taken from the order");
            }

            prop_assert!(check_permutation(&current, &desired).is_ok());
        }

        #[test]
        fn diff_is_idempotent(ids in proptest::collection::vec(any::<u16>(), 0..16)) {
            let order: BootOrder = ids.into_iter().map(BootId::new).collect();
            prop_assert_eq!(diff(&order, &order), OrderDiff::Unchanged);
        }
    }
}

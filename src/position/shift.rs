//! Position arithmetic.
//!
//! Pure functions computing which siblings move when a record is created,
//! moved or deleted. Stores turn the resulting [`Shift`]s into bulk range
//! updates.

use crate::interfaces::{PositionRange, RecordKey, Shift, ShiftDirection};

/// Sibling shift required by a move from `old` to `new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftPlan {
    /// Target equals current position.
    None,
    /// Moving earlier: siblings in `[from, to]` move one step towards the end.
    TowardsEnd { from: i64, to: i64 },
    /// Moving later: siblings in `[from, to]` move one step towards the start.
    TowardsStart { from: i64, to: i64 },
}

impl ShiftPlan {
    /// Plan for moving a record from `old` to `new`.
    ///
    /// Moving earlier increments `[new, old)`; moving later decrements
    /// `(old, new]`. The origin slot is never part of the range.
    pub fn for_move(old: i64, new: i64) -> Self {
        if new < old {
            ShiftPlan::TowardsEnd {
                from: new,
                to: old - 1,
            }
        } else if new > old {
            ShiftPlan::TowardsStart {
                from: old + 1,
                to: new,
            }
        } else {
            ShiftPlan::None
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ShiftPlan::None)
    }

    /// The bulk update for this plan, leaving `exclude` untouched.
    pub fn shift(&self, exclude: Option<RecordKey>) -> Option<Shift> {
        let shift = match *self {
            ShiftPlan::None => return None,
            ShiftPlan::TowardsEnd { from, to } => {
                Shift::new(PositionRange::Between(from, to), ShiftDirection::Increment)
            }
            ShiftPlan::TowardsStart { from, to } => {
                Shift::new(PositionRange::Between(from, to), ShiftDirection::Decrement)
            }
        };
        Some(match exclude {
            Some(key) => shift.excluding(key),
            None => shift,
        })
    }

    /// Number of sibling slots the plan spans.
    pub fn span(&self) -> u64 {
        match *self {
            ShiftPlan::None => 0,
            ShiftPlan::TowardsEnd { from, to } | ShiftPlan::TowardsStart { from, to } => {
                (to - from + 1) as u64
            }
        }
    }
}

/// Shift closing the gap left by a record deleted at `position`.
pub fn shift_after_delete(position: i64) -> Shift {
    Shift::new(PositionRange::After(position), ShiftDirection::Decrement)
}

/// Next free slot given the current maximum of a sequence.
pub fn next_position(max: Option<i64>, initial: i64) -> i64 {
    match max {
        Some(max) => max + 1,
        None => initial,
    }
}

/// Whether `positions` are exactly `{initial, ..., initial + n - 1}`.
///
/// Order of the input does not matter.
pub fn is_contiguous(positions: &[i64], initial: i64) -> bool {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .enumerate()
        .all(|(i, position)| *position == initial + i as i64)
}

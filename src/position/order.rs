//! Ordering by position.

use crate::config::SequenceSpec;

/// Sort direction over the position column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionOrder {
    #[default]
    Ascending,
    Descending,
}

impl PositionOrder {
    pub fn reverse(self) -> Self {
        match self {
            PositionOrder::Ascending => PositionOrder::Descending,
            PositionOrder::Descending => PositionOrder::Ascending,
        }
    }

    /// Default ordering for listings of a sequence type.
    ///
    /// `Some(Ascending)` when the `SequenceSpec` opts into always ordering by
    /// position, `None` (store order) otherwise.
    pub fn for_spec(spec: &SequenceSpec) -> Option<Self> {
        spec.always_order_by_position
            .then_some(PositionOrder::Ascending)
    }
}

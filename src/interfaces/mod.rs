//! Abstract interfaces for positional components.
//!
//! These traits define the contracts for:
//! - Host records (the capability surface a row type exposes)
//! - Sequence storage (range shifts, aggregates and atomic writes)

pub mod record;
pub mod sequence_store;

pub use record::{Entry, Positioned, RecordKey, Scope, ScopeValue};
pub use sequence_store::{
    PositionRange, Result, SequenceStore, Shift, ShiftDirection, StorageError,
};

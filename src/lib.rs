//! Positional - ordered positions for relational records
//!
//! Keeps an integer `position` column dense and contiguous within a scope
//! of sibling rows: new rows are appended, moves shift the rows in between,
//! deletes close the gap and swaps exchange two positions atomically.
//!
//! The [`PositionMaintainer`] carries the ordering rules; a
//! [`SequenceStore`] persists them (SQLite/PostgreSQL via `sqlx` and
//! `sea-query`, or an in-memory mock with the `test-utils` feature).

pub mod config;
pub mod interfaces;
pub mod position;
pub mod storage;
pub mod utils;

pub use config::{SequenceSpec, Settings};
pub use interfaces::{Entry, Positioned, RecordKey, Scope, ScopeValue, SequenceStore};
pub use position::{MoveOutcome, PositionError, PositionMaintainer, PositionOrder, ShiftPlan};
pub use storage::init_storage;

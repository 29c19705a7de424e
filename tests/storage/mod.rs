//! Shared storage integration tests.
//!
//! Tests the SequenceStore interface against all implementations.
//! Each implementation module imports these test functions and runs them.

pub mod sequence_store_tests;

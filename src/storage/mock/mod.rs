//! Mock storage implementations for testing.

mod sequence_store;

pub use sequence_store::MockSequenceStore;

#[cfg(test)]
mod tests;

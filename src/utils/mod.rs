//! Startup helpers.

pub mod bootstrap;

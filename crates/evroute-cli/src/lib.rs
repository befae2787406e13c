//! evroute CLI library.
//!
//! Command handlers, output formatting and logging setup for the `evroute`
//! binary, kept in a library so they can be exercised from tests.

pub mod commands;
pub mod logging;
pub mod output;

//! Process-wide tracing/logging setup shared by the binaries.

pub mod tracing;

pub use crate::tracing::{LogFormat, init, init_with};

//! Shared library modules providing error types, file utilities, paths, and telemetry initialization.

pub mod errors;
pub mod fs;
pub mod paths;
pub mod telemetry;

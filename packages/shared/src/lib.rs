//! Utilities shared by the Tsuyaku server and client binaries.

pub mod logger;
pub mod time;

//! Terminal client for the Tsuyaku relay.
//!
//! Joins a room over WebSocket, sends lines typed at the prompt and shows every
//! incoming message in the reader's own language next to the original.

mod domain;
mod error;
mod formatter;
mod room;
mod runner;
mod session;
mod ui;

pub use error::ClientError;
pub use runner::{ClientSettings, run_client};

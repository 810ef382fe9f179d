//! Multilingual chat relay library.
//!
//! Rooms of participants who each read in their own language. Every message is
//! translated once per language present in the room and fanned out over WebSocket
//! as a single payload carrying all translations.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;

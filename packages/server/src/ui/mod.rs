//! WebSocket relay server.

mod handler;
mod server;
mod signal;
pub mod state;

pub use handler::{CLOSE_ALREADY_JOINED, CLOSE_INVALID_JOIN_REQUEST};
pub use server::{Server, build_router};
pub use state::AppState;

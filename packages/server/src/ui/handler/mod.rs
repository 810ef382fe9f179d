//! HTTP and WebSocket handlers.

mod http;
mod websocket;

pub use http::{create_room, get_room_detail, health_check, list_languages};
pub use websocket::{CLOSE_ALREADY_JOINED, CLOSE_INVALID_JOIN_REQUEST, websocket_handler};

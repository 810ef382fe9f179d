//! Data Transfer Objects (DTOs) for the relay.
//!
//! DTOs are organized by protocol:
//! - `websocket`: inbound / outbound WebSocket events
//! - `http`: HTTP API response bodies

pub mod conversion;
pub mod http;
pub mod websocket;

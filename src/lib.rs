//! Library crate for battlebit-back: a shared-board toggle game served over JSON-RPC.

pub mod config;
/// Wire payloads: JSON-RPC envelopes, params and session snapshots.
pub mod dto;
/// Service-level errors and their JSON-RPC codes.
pub mod error;
/// HTTP, WebSocket and SSE routes.
pub mod routes;
/// Request handling on top of the session engine.
pub mod services;
/// Session engine: boards, sessions, autopilots and the registry.
pub mod state;

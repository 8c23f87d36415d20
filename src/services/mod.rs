/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// JSON-RPC decoding and method dispatch onto the session engine.
pub mod rpc_service;
/// Server-Sent Events forwarding of session events.
pub mod sse_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;

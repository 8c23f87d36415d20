use thiserror::Error;
use validator::ValidationErrors;

use crate::{dto::rpc::RpcErrorBody, state::GameError};

/// JSON-RPC reserved code: the payload is not valid JSON-RPC.
pub const PARSE_ERROR: i64 = -32700;
/// JSON-RPC reserved code: unknown method.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// JSON-RPC reserved code: params do not match the method.
pub const INVALID_PARAMS: i64 = -32602;
/// JSON-RPC reserved code: the server failed to build a response.
pub const INTERNAL_ERROR: i64 = -32603;

/// Errors that can occur while serving a request.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Failure reported by the session engine.
    #[error(transparent)]
    Game(#[from] GameError),
    /// The payload could not be decoded as a request.
    #[error("parse error: {0}")]
    Parse(String),
    /// The params could not be decoded or failed validation.
    #[error("invalid params: {0}")]
    InvalidParams(String),
    /// No handler is registered under this method name.
    #[error("method `{0}` not found")]
    MethodNotFound(String),
    /// The result could not be encoded.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::InvalidParams(format!("validation failed: {err}"))
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::InvalidParams(err.to_string())
    }
}

impl ServiceError {
    /// Code reported in the JSON-RPC error object.
    pub fn code(&self) -> i64 {
        match self {
            ServiceError::Game(GameError::SessionNotFound(_)) => 404,
            ServiceError::Game(GameError::GameFull | GameError::DuplicatePlayer) => 409,
            ServiceError::Game(GameError::SessionLimitReached { .. }) => 429,
            ServiceError::Parse(_) => PARSE_ERROR,
            ServiceError::InvalidParams(_) => INVALID_PARAMS,
            ServiceError::MethodNotFound(_) => METHOD_NOT_FOUND,
            ServiceError::Internal(_) => INTERNAL_ERROR,
        }
    }
}

impl From<ServiceError> for RpcErrorBody {
    fn from(err: ServiceError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

//! HTTP gateway for the ragscope engine.
//!
//! [`GatewayServer::build`] returns an axum [`Router`](axum::Router) over a
//! shared [`AppState`]; the caller owns the listener.

/// Engine errors as HTTP responses.
pub mod error;
/// Request logging.
pub mod middleware;
/// Request and response bodies.
pub mod models;
/// Route handlers.
pub mod routes;
/// Router and shared state.
pub mod server;

pub use error::ApiError;
pub use server::{AppState, GatewayServer, RetrievalDefaults};

//! # REST API Components
//!
//! HTTP routing, request/response types and error mapping for the secrets
//! API, plus the server loop that runs it.

pub mod docs;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use routes::{build_router, ApiState};
pub use server::start_api_server;

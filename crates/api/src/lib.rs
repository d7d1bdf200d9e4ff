//! HTTP API: configuration, auth middleware, routing, and error mapping.

pub mod app;
pub mod config;
pub mod middleware;

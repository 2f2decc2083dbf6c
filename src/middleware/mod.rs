//! HTTP middleware components.

/// Operator API key authentication
pub mod auth;

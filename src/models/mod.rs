//! Data models for provider requests and responses.
//!
//! Nothing here is persisted: every type is either a provider wire format,
//! a service result, or a request body accepted by the demo server.

/// Per-step results for multi-step flows
pub mod outcome;
/// Content template models
pub mod template;
/// OAuth token models
pub mod token;
/// Twilio provisioning models
pub mod twilio;
/// WhatsApp Business Account models
pub mod waba;

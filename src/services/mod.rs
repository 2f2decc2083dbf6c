//! Business logic services.
//!
//! Services contain the provider workflows, separated from HTTP handlers.
//! Twilio workflows are free functions taking the shared `TwilioClient`
//! first; the Graph API side is a single client type.

pub mod bundle_service;
pub mod classifier;
pub mod credentials;
pub mod graph_client;
pub mod number_service;
pub mod sender_service;
pub mod signature;
pub mod subaccount_service;
pub mod template_service;
pub mod twilio_client;

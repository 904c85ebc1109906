//! Backend HTTP access
//!
//! - `client`: action-based reqwest client with bearer auth
//! - `envelope`: the backend's response envelopes
//! - `de`: lenient field deserializers

mod client;
pub mod de;
pub mod envelope;

pub use client::{ApiClient, Params};
pub use envelope::{Ack, DataEnvelope, ItemsEnvelope, PageEnvelope, TotalEnvelope};

//! Stream event wire format: type + payload + envelope.
//!
//! This crate defines the wire shape of a single stream event, envelope injection and SSE
//! framing. It does not depend on ragent; `ragent::protocol` bridges `RunEvent` into
//! [`ProtocolEvent`] and transports call [`to_json`] or [`to_sse`].

pub mod envelope;
pub mod event;

pub use envelope::{to_json, to_sse, Envelope, EnvelopeState};
pub use event::ProtocolEvent;

//! wayfare-wire: wire boundary of the travel agent client
//!
//! This crate turns the agent service's server-sent event stream into typed
//! frames and provides the HTTP clients for the streaming agent endpoint and
//! the plain REST API.

pub mod api;
pub mod client;
pub mod error;
pub mod frame;
pub mod stream;
pub mod types;
pub mod utf8;

pub use api::TravelApi;
pub use client::AgentClient;
pub use error::{Error, Result};
pub use frame::{FrameDecoder, RawFrame};
pub use stream::{AgentFrame, ChunkStream, DecodedFrame, Dialect};
pub use types::*;

//! Progress streaming for scrape attempts
//!
//! This crate provides the wire model sent to clients and the single-attempt
//! channel that carries it from the orchestrator to the HTTP layer.

mod channel;
mod sink;
mod types;

pub use channel::{ChannelState, ProgressChannel, ProgressReceiver, ProgressSender, SequencedMessage};
pub use sink::{ProgressSink, TransportFault};
pub use types::*;

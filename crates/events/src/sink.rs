use async_trait::async_trait;
use attendance_core::ProgressEvent;
use thiserror::Error;

/// The outbound stream could not take a write.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TransportFault {
    #[error("Progress consumer disconnected")]
    ConsumerGone,

    #[error("Progress channel already closed")]
    ChannelClosed,
}

/// Receives progress notifications from a running attempt.
///
/// `emit` resolves once the event has been handed to the consumer, so the
/// consumer observes steps in exactly the order they happened.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn emit(&self, event: ProgressEvent) -> Result<(), TransportFault>;
}

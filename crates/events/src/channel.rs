//! Single-attempt progress channel.
//!
//! One producer (the attempt driver) and one consumer (the HTTP response or a
//! terminal). Every frame carries an acknowledgement that fires when the
//! consumer takes it, so `send` only returns once the previous step is visible
//! to the client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use attendance_core::{ProgressEvent, ScrapeOutcome};
use futures::stream::{self, Stream};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::sink::{ProgressSink, TransportFault};
use crate::types::WireMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Streaming,
    Closed,
}

/// A record plus its position in the stream, starting at 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencedMessage {
    pub seq: u64,
    pub message: WireMessage,
}

struct Frame {
    seq: u64,
    message: WireMessage,
    ack: oneshot::Sender<()>,
}

type SharedState = Arc<Mutex<ChannelState>>;

fn read_state(state: &SharedState) -> ChannelState {
    *state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Returns true when this call performed the transition.
fn set_state(state: &SharedState, next: ChannelState) -> bool {
    let mut guard = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    match (*guard, next) {
        (ChannelState::Closed, _) => false,
        (ChannelState::Streaming, ChannelState::Idle) => false,
        (current, next) if current == next => false,
        _ => {
            *guard = next;
            true
        }
    }
}

pub struct ProgressChannel;

impl ProgressChannel {
    pub fn open() -> (ProgressSender, ProgressReceiver) {
        let (tx, rx) = mpsc::channel(1);
        let state = Arc::new(Mutex::new(ChannelState::Idle));
        (
            ProgressSender {
                tx: Mutex::new(Some(tx)),
                state: Arc::clone(&state),
                next_seq: AtomicU64::new(0),
            },
            ProgressReceiver { rx, state },
        )
    }
}

pub struct ProgressSender {
    tx: Mutex<Option<mpsc::Sender<Frame>>>,
    state: SharedState,
    next_seq: AtomicU64,
}

impl ProgressSender {
    pub fn state(&self) -> ChannelState {
        read_state(&self.state)
    }

    fn sender(&self) -> Option<mpsc::Sender<Frame>> {
        self.tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Send one record and wait until the consumer has taken it.
    pub async fn send(&self, message: WireMessage) -> Result<(), TransportFault> {
        let tx = self.sender().ok_or(TransportFault::ChannelClosed)?;

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let (ack_tx, ack_rx) = oneshot::channel();
        let frame = Frame {
            seq,
            message,
            ack: ack_tx,
        };

        if tx.send(frame).await.is_err() {
            warn!(seq, "Progress consumer gone before send, closing channel");
            self.close();
            return Err(TransportFault::ConsumerGone);
        }
        set_state(&self.state, ChannelState::Streaming);

        ack_rx.await.map_err(|_| {
            warn!(seq, "Progress consumer dropped an undelivered record, closing channel");
            self.close();
            TransportFault::ConsumerGone
        })
    }

    /// Send the terminal record, then close.
    pub async fn finish(&self, outcome: &ScrapeOutcome) -> Result<(), TransportFault> {
        let result = self.send(WireMessage::from(outcome)).await;
        self.close();
        result
    }

    /// Idempotent; the consumer sees end-of-stream once buffered frames drain.
    pub fn close(&self) -> bool {
        self.tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        set_state(&self.state, ChannelState::Closed)
    }

    /// Resolves when the consumer has gone away or the channel was closed.
    pub async fn closed(&self) {
        if let Some(tx) = self.sender() {
            tx.closed().await;
        }
    }
}

#[async_trait]
impl ProgressSink for ProgressSender {
    async fn emit(&self, event: ProgressEvent) -> Result<(), TransportFault> {
        self.send(WireMessage::progress(event.message)).await
    }
}

pub struct ProgressReceiver {
    rx: mpsc::Receiver<Frame>,
    state: SharedState,
}

impl ProgressReceiver {
    pub fn state(&self) -> ChannelState {
        read_state(&self.state)
    }

    /// Next record, or `None` once the producer closed the channel.
    pub async fn recv(&mut self) -> Option<SequencedMessage> {
        let frame = self.rx.recv().await?;
        // The producer may have given up already; the record is still delivered.
        let _ = frame.ack.send(());
        Some(SequencedMessage {
            seq: frame.seq,
            message: frame.message,
        })
    }

    pub fn into_stream(self) -> impl Stream<Item = SequencedMessage> + Send {
        stream::unfold(self, |mut rx| async move {
            let next = rx.recv().await?;
            Some((next, rx))
        })
    }

    /// Drain every remaining record.
    pub async fn collect(mut self) -> Vec<SequencedMessage> {
        let mut messages = Vec::new();
        while let Some(message) = self.recv().await {
            messages.push(message);
        }
        messages
    }
}

impl Drop for ProgressReceiver {
    fn drop(&mut self) {
        set_state(&self.state, ChannelState::Closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_state_transitions() {
        let (tx, mut rx) = ProgressChannel::open();
        assert_eq!(tx.state(), ChannelState::Idle);

        let producer = tokio::spawn(async move {
            tx.emit(ProgressEvent::new("one")).await.unwrap();
            assert_eq!(tx.state(), ChannelState::Streaming);
            assert!(tx.close());
            assert!(!tx.close());
            tx.state()
        });

        let first = rx.recv().await.unwrap();
        assert_eq!(first.seq, 0);
        assert_eq!(first.message, WireMessage::progress("one"));
        assert!(rx.recv().await.is_none());

        assert_eq!(producer.await.unwrap(), ChannelState::Closed);
    }

    #[tokio::test]
    async fn test_messages_arrive_in_order() {
        let (tx, rx) = ProgressChannel::open();

        tokio::spawn(async move {
            for i in 0..5 {
                tx.emit(ProgressEvent::new(format!("step {i}"))).await.unwrap();
            }
            tx.finish(&ScrapeOutcome::success("A", "1%")).await.unwrap();
        });

        let messages = rx.collect().await;
        assert_eq!(messages.len(), 6);
        for (i, m) in messages.iter().enumerate() {
            assert_eq!(m.seq, i as u64);
        }
        assert!(messages.last().unwrap().message.is_terminal());
        assert!(messages[..5].iter().all(|m| !m.message.is_terminal()));
    }

    #[tokio::test]
    async fn test_send_waits_for_consumer() {
        let (tx, mut rx) = ProgressChannel::open();

        let pending = tokio::spawn(async move {
            tx.emit(ProgressEvent::new("hold")).await.unwrap();
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!pending.is_finished());

        rx.recv().await.unwrap();
        pending.await.unwrap();
    }

    #[tokio::test]
    async fn test_consumer_gone() {
        let (tx, rx) = ProgressChannel::open();
        drop(rx);

        let err = tx.emit(ProgressEvent::new("lost")).await.unwrap_err();
        assert_eq!(err, TransportFault::ConsumerGone);
        assert_eq!(tx.state(), ChannelState::Closed);

        let err = tx.emit(ProgressEvent::new("again")).await.unwrap_err();
        assert_eq!(err, TransportFault::ChannelClosed);
    }

    #[tokio::test]
    async fn test_consumer_dropped_with_record_buffered() {
        let (tx, rx) = ProgressChannel::open();

        let pending = tokio::spawn(async move {
            let result = tx.emit(ProgressEvent::new("buffered")).await;
            (result, tx.state())
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!pending.is_finished());
        drop(rx);

        let (result, state) = pending.await.unwrap();
        assert_eq!(result, Err(TransportFault::ConsumerGone));
        assert_eq!(state, ChannelState::Closed);
    }

    #[tokio::test]
    async fn test_closed_resolves_on_disconnect() {
        let (tx, rx) = ProgressChannel::open();
        let waiter = tokio::spawn(async move { tx.closed().await });
        drop(rx);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("closed() should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn test_no_send_after_finish() {
        let (tx, rx) = ProgressChannel::open();
        let consumer = tokio::spawn(rx.collect());

        tx.finish(&ScrapeOutcome::Rejected {
            reason: "Invalid Registration Number".to_string(),
        })
        .await
        .unwrap();
        assert_eq!(
            tx.emit(ProgressEvent::new("late")).await,
            Err(TransportFault::ChannelClosed)
        );

        let messages = consumer.await.unwrap();
        assert_eq!(messages.len(), 1);
    }
}

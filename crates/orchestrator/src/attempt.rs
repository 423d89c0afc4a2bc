//! Binds one orchestrator run to one progress channel.

use std::sync::Arc;

use attendance_core::{Credential, ProgressEvent, ScrapeOutcome};
use events::{ProgressChannel, ProgressReceiver, ProgressSender, ProgressSink, WireMessage};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::scraper::ScrapeOrchestrator;

/// How an attempt's channel came to be closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptEnd {
    /// Terminal record sent (or at least attempted)
    Finished(ScrapeOutcome),
    /// The consumer went away; the browser was torn down without further records
    Cancelled,
    /// The orchestrator task panicked; a best-effort fault record was sent
    Crashed(String),
}

/// Open a channel, start the attempt in the background and hand back the
/// consumer side.
pub fn spawn_attempt(
    orchestrator: Arc<ScrapeOrchestrator>,
    credential: Credential,
) -> ProgressReceiver {
    let (sender, receiver) = ProgressChannel::open();
    let span = info_span!(
        "scrape_attempt",
        attempt_id = %Uuid::new_v4(),
        username = %credential
    );
    tokio::spawn(drive_attempt(orchestrator, credential, sender).instrument(span));
    receiver
}

/// Run one attempt to completion against `sender`.
///
/// The orchestrator runs on its own task so a panic is contained, and it is
/// raced against the consumer disconnecting: on disconnect the task is
/// aborted, which drops the session guard and tears the browser down. The
/// channel is closed on every path before this returns.
pub async fn drive_attempt(
    orchestrator: Arc<ScrapeOrchestrator>,
    credential: Credential,
    sender: ProgressSender,
) -> AttemptEnd {
    let sender = Arc::new(sender);
    info!("Scrape attempt started");

    let run_sender = Arc::clone(&sender);
    let run_credential = credential.clone();
    let mut run = tokio::spawn(
        async move {
            run_sender
                .emit(ProgressEvent::new(format!(
                    "Started processing query for username: {run_credential}"
                )))
                .await
                .ok()?;
            Some(orchestrator.run(&run_credential, run_sender.as_ref()).await)
        }
        .in_current_span(),
    );

    let joined = tokio::select! {
        joined = &mut run => joined,
        _ = sender.closed() => {
            run.abort();
            // Wait for the abort to land so the guard has dropped before we return.
            let _ = run.await;
            sender.close();
            info!("Consumer disconnected, attempt cancelled");
            return AttemptEnd::Cancelled;
        }
    };

    let end = match joined {
        Ok(Some(outcome)) => {
            if let Err(e) = sender.finish(&outcome).await {
                warn!("Terminal record not delivered: {}", e);
            }
            AttemptEnd::Finished(outcome)
        }
        Ok(None) => {
            info!("Consumer disconnected before the attempt started");
            AttemptEnd::Cancelled
        }
        Err(join_error) => {
            let reason = if join_error.is_panic() {
                "orchestrator panicked".to_string()
            } else {
                join_error.to_string()
            };
            warn!(reason = %reason, "Scrape attempt crashed");
            let message = WireMessage::fault(format!("Scraping failed for {credential}: {reason}"));
            if let Err(e) = sender.send(message).await {
                warn!("Crash record not delivered: {}", e);
            }
            AttemptEnd::Crashed(reason)
        }
    };

    sender.close();
    end
}

//! Client for a running server's `/api/scrape` stream.

use anyhow::{bail, Context, Result};
use eventsource_stream::Eventsource;
use events::WireMessage;
use futures_util::StreamExt;

pub struct WatchClient {
    base_url: String,
    client: reqwest::Client,
}

impl WatchClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Follow the attempt for `username`, handing every record to `on_message`.
    /// Returns the terminal record.
    pub async fn watch(
        &self,
        username: &str,
        mut on_message: impl FnMut(&WireMessage),
    ) -> Result<WireMessage> {
        let url = format!("{}/api/scrape", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("query", username)])
            .header("Accept", "text/event-stream")
            .send()
            .await
            .with_context(|| format!("Failed to connect to {url}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Server rejected the request ({status}): {body}");
        }

        let mut stream = response.bytes_stream().eventsource();

        while let Some(event) = stream.next().await {
            let event = event.context("Event stream interrupted")?;
            if event.data.is_empty() {
                continue;
            }

            let message: WireMessage = match serde_json::from_str(&event.data) {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!("Failed to parse event: {} - data: {}", e, event.data);
                    continue;
                }
            };

            on_message(&message);
            if message.is_terminal() {
                return Ok(message);
            }
        }

        bail!("Stream ended before a result was received")
    }
}

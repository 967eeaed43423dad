//! NATS subscription for incoming prediction requests
//!
//! Service instances sharing a queue group split the request stream
//! between them; without a group every instance sees every request.

use crate::config::NatsConfig;
use anyhow::Result;
use async_nats::{Client, Subscriber};
use tracing::info;

/// Where and how prediction requests are received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConsumer {
    subject: String,
    queue_group: Option<String>,
}

impl RequestConsumer {
    /// Create a consumer for `subject`, optionally load-balanced through `queue_group`.
    pub fn new(subject: &str, queue_group: Option<&str>) -> Self {
        Self {
            subject: subject.to_string(),
            queue_group: queue_group
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string),
        }
    }

    /// Create a consumer from the NATS section of the configuration.
    pub fn from_config(config: &NatsConfig) -> Self {
        Self::new(&config.request_subject, config.queue_group.as_deref())
    }

    /// Subscribe on `client`, joining the queue group when one is set.
    pub async fn subscribe(&self, client: &Client) -> Result<Subscriber> {
        let subscriber = match &self.queue_group {
            Some(group) => {
                client
                    .queue_subscribe(self.subject.clone(), group.clone())
                    .await?
            }
            None => client.subscribe(self.subject.clone()).await?,
        };

        info!(
            subject = %self.subject,
            queue_group = self.queue_group.as_deref().unwrap_or("-"),
            "Subscribed to prediction request subject"
        );
        Ok(subscriber)
    }

    /// Get the request subject
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Get the queue group, if requests are load-balanced
    pub fn queue_group(&self) -> Option<&str> {
        self.queue_group.as_deref()
    }
}

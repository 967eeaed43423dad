//! NATS publisher for prediction replies

use crate::types::prediction::PredictionReply;
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Publishes replies to the requester's inbox, or to a fallback subject
/// when the request did not ask for a reply.
#[derive(Clone)]
pub struct ReplyProducer {
    client: Client,
    fallback_subject: String,
}

impl ReplyProducer {
    /// Create a new reply producer
    pub fn new(client: Client, fallback_subject: &str) -> Self {
        Self {
            client,
            fallback_subject: fallback_subject.to_string(),
        }
    }

    /// Publish a reply
    pub async fn publish(&self, reply_to: Option<Subject>, reply: &PredictionReply) -> Result<()> {
        let payload = serde_json::to_vec(reply)?;
        let subject = reply_to.unwrap_or_else(|| Subject::from(self.fallback_subject.as_str()));

        debug!(
            prediction_id = %reply.prediction_id,
            subject = %subject,
            ok = reply.is_ok(),
            "Publishing prediction reply"
        );

        self.client.publish(subject, payload.into()).await?;
        Ok(())
    }

    /// Get the fallback reply subject
    pub fn fallback_subject(&self) -> &str {
        &self.fallback_subject
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running NATS server
}

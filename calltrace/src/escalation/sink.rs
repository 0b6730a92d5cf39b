use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{TraceError, TraceResult};

/// External destination for serialized error records.
#[async_trait]
pub trait ErrorSink: Send + Sync {
    /// Publishes one serialized record to `destination`.
    async fn publish(&self, destination: &str, payload: String) -> TraceResult<()>;
}

/// Sink that drops every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardErrorSink;

#[async_trait]
impl ErrorSink for DiscardErrorSink {
    async fn publish(&self, _destination: &str, _payload: String) -> TraceResult<()> {
        Ok(())
    }
}

/// A record delivered through [`ChannelErrorSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage {
    /// Destination the record was published to.
    pub destination: String,
    /// Serialized record.
    pub payload: String,
}

/// Sink backed by a bounded tokio channel.
///
/// The receiving half plays the role of the queue consumer.
#[derive(Debug, Clone)]
pub struct ChannelErrorSink {
    sender: mpsc::Sender<ErrorMessage>,
}

impl ChannelErrorSink {
    /// Creates a sink and the receiver its records arrive on.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ErrorMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl ErrorSink for ChannelErrorSink {
    async fn publish(&self, destination: &str, payload: String) -> TraceResult<()> {
        self.sender
            .send(ErrorMessage {
                destination: destination.to_string(),
                payload,
            })
            .await
            .map_err(|err| TraceError::publish(destination, err.to_string()))
    }
}

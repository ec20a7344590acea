use async_trait::async_trait;
use conclave_core::{AgentMessage, ConclaveError, ConclaveResult};
use tokio::sync::mpsc;
use tracing::info;

/// Port through which assignment messages reach agents.
#[async_trait]
pub trait Communication: Send + Sync {
    fn name(&self) -> &str;
    async fn send(&self, message: AgentMessage) -> ConclaveResult<()>;
}

/// In-process message bus backed by a bounded `tokio` channel.
pub struct ChannelCommunication {
    tx: mpsc::Sender<AgentMessage>,
}

impl ChannelCommunication {
    /// Creates the bus and the receiving end agents read from.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<AgentMessage>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Communication for ChannelCommunication {
    fn name(&self) -> &str {
        "channel"
    }

    async fn send(&self, message: AgentMessage) -> ConclaveResult<()> {
        let to = message.to.clone();
        self.tx
            .send(message)
            .await
            .map_err(|_| ConclaveError::Delivery(format!("bus closed, cannot reach {to}")))
    }
}

/// Logs every message instead of delivering it.
#[derive(Debug, Default)]
pub struct LogCommunication;

#[async_trait]
impl Communication for LogCommunication {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, message: AgentMessage) -> ConclaveResult<()> {
        info!(
            message_id = %message.id,
            from = %message.from,
            to = %message.to,
            task_type = %message.context.task_type,
            "Assignment message"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use conclave_core::TaskContext;

    fn message(to: &str) -> AgentMessage {
        AgentMessage::request("orchestrator", to, &TaskContext::new("t", "d"), None).unwrap()
    }

    #[tokio::test]
    async fn test_channel_delivers() {
        let (bus, mut rx) = ChannelCommunication::new(4);
        bus.send(message("a-1")).await.unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.to, "a-1");
    }

    #[tokio::test]
    async fn test_channel_closed_is_delivery_error() {
        let (bus, rx) = ChannelCommunication::new(1);
        drop(rx);
        let err = bus.send(message("a-1")).await.unwrap_err();
        assert!(matches!(err, ConclaveError::Delivery(msg) if msg.contains("a-1")));
    }

    #[tokio::test]
    async fn test_log_accepts_everything() {
        assert!(LogCommunication.send(message("x")).await.is_ok());
        assert_eq!(LogCommunication.name(), "log");
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, Mutex};

use super::PubSub;
use crate::errors::Result;

const TOPIC_CAPACITY: usize = 256;

/// In-process publish/subscribe bus.
///
/// Keeps one broadcast channel per topic name. Every subscriber gets its own forwarding task
/// that relays broadcast messages into an owned `mpsc` receiver, so callers see the same
/// `Receiver<Vec<u8>>` shape regardless of which `PubSub` implementation is wired in.
#[derive(Clone, Debug, Default)]
pub struct LocalBus {
    topics: Arc<Mutex<HashMap<String, broadcast::Sender<Vec<u8>>>>>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    async fn sender_for(&self, topic: &str) -> broadcast::Sender<Vec<u8>> {
        let mut topics = self.topics.lock().await;
        topics
            .entry(topic.to_owned())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .clone()
    }
}

#[async_trait]
impl PubSub for LocalBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        // No subscribers yet is not an error: the gateway publishes its own `service.up`
        // announcement before any peer may be listening.
        let _ = self.sender_for(topic).await.send(payload);
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<mpsc::Receiver<Vec<u8>>> {
        let mut rx = self.sender_for(topic).await.subscribe();
        let (tx, out_rx) = mpsc::channel(TOPIC_CAPACITY);

        tokio::spawn(async move {
            while let Ok(message) = rx.recv().await {
                if tx.send(message).await.is_err() {
                    break;
                }
            }
        });

        Ok(out_rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let bus = LocalBus::new();
        let mut rx = bus.subscribe("service.up").await.unwrap();

        bus.publish("service.up", b"hello".to_vec()).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received, b"hello");
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let bus = LocalBus::new();
        let mut up = bus.subscribe("service.up").await.unwrap();
        let mut down = bus.subscribe("service.down").await.unwrap();

        bus.publish("service.up", b"up".to_vec()).await.unwrap();

        assert_eq!(up.recv().await.unwrap(), b"up");
        assert!(down.try_recv().is_err());
    }
}

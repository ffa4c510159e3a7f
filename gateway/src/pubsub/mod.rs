// SPDX-License-Identifier: AGPL-3.0-or-later

mod local;

pub use local::LocalBus;

use async_trait::async_trait;
use tokio::sync::mpsc::Receiver;

use crate::errors::Result;

/// Topic service lifecycle announcements are published on.
pub const TOPIC_SERVICE_UP: &str = "service.up";

/// Topic service removal announcements are published on.
pub const TOPIC_SERVICE_DOWN: &str = "service.down";

/// A minimal publish/subscribe interface for service lifecycle events.
///
/// The original system wires this to NSQ (see `nsqd_tcp_url` / `nsqlookup_http_url` on
/// [`crate::config::Configuration`]); only a topic name and a byte payload cross this boundary,
/// mirroring how the upstream `eventbus.On`/`eventbus.Emit` calls are oblivious to the underlying
/// transport. [`LocalBus`] is the in-process implementation used for single-node operation,
/// development and tests; a network-backed implementation can be swapped in without touching the
/// discovery service.
#[async_trait]
pub trait PubSub: Send + Sync + 'static {
    /// Publishes a JSON-encoded payload on `topic`.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()>;

    /// Subscribes to `topic`, returning a channel that receives every subsequent publish.
    async fn subscribe(&self, topic: &str) -> Result<Receiver<Vec<u8>>>;
}

// SPDX-License-Identifier: AGPL-3.0-or-later

use anyhow::Result;
use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Configuration object holding all important variables throughout the application.
///
/// All values can be overridden through environment variables of the same name (upper-cased).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// HTTP port the gateway listens on for client GraphQL and websocket traffic. Defaults to
    /// 8090.
    pub port: u16,

    /// Hostname this gateway announces itself under when it publishes its own `service.up`
    /// event.
    pub published_hostname: String,

    /// Port this gateway announces itself under when it publishes its own `service.up` event.
    pub published_port: u16,

    /// Address of the NSQD TCP endpoint used by a real pub/sub transport.
    ///
    /// Only meaningful when a network-backed `PubSub` implementation is configured; the bundled
    /// in-process transport ignores this value.
    pub nsqd_tcp_url: String,

    /// Address of the `nsqlookupd` HTTP endpoint used by a real pub/sub transport.
    ///
    /// Only meaningful when a network-backed `PubSub` implementation is configured; the bundled
    /// in-process transport ignores this value.
    pub nsqlookup_http_url: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            port: 8090,
            published_hostname: "apigateway".into(),
            published_port: 8090,
            nsqd_tcp_url: "localhost:4150".into(),
            nsqlookup_http_url: "localhost:4161".into(),
        }
    }
}

impl Configuration {
    /// Loads configuration from environment variables, falling back to defaults for anything
    /// not set.
    pub fn from_env() -> Result<Self> {
        let config = Figment::from(Serialized::defaults(Configuration::default()))
            .merge(Env::raw())
            .extract()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::Configuration;

    #[test]
    fn defaults() {
        let config = Configuration::default();
        assert_eq!(config.port, 8090);
        assert_eq!(config.published_hostname, "apigateway");
    }
}

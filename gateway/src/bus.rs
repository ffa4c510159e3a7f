// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::manager::GatewaySender;

/// Sender for the gateway's cross-service communication bus.
pub type ServiceSender = GatewaySender;

/// Messages which can be sent on the communication bus between the discovery and HTTP services.
#[derive(Clone, Debug)]
pub enum ServiceMessage {
    /// The composed schema was rebuilt after a registry change.
    SchemaRebuilt,

    /// A backend was registered or re-registered.
    BackendRegistered(String),

    /// A backend was removed.
    BackendRemoved(String),
}

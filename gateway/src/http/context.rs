// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::bus::ServiceSender;
use crate::context::Context;

/// Shared state for every HTTP and socket route.
#[derive(Clone)]
pub struct HttpServiceContext {
    pub context: Context,
    pub tx: ServiceSender,
    pub metrics: Arc<PrometheusHandle>,
}

impl HttpServiceContext {
    pub fn new(context: Context, tx: ServiceSender, metrics: PrometheusHandle) -> Self {
        Self {
            context,
            tx,
            metrics: Arc::new(metrics),
        }
    }
}

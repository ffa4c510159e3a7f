// SPDX-License-Identifier: AGPL-3.0-or-later

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Installs the global Prometheus recorder and returns a handle that renders the current metrics
/// snapshot as exposition text, served at the gateway's own `/metrics` route.
///
/// Idempotent: the underlying recorder can only be installed once per process, so repeat calls
/// (every HTTP service restart within a test binary, for instance) just return the same handle.
pub fn install() -> Result<PrometheusHandle> {
    if let Some(handle) = HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = HANDLE.set(handle.clone());
    Ok(handle)
}

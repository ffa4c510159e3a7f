// SPDX-License-Identifier: AGPL-3.0-or-later

#![allow(clippy::uninlined_format_args)]

use gateway::{Configuration, Node};

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = Configuration::from_env().expect("could not load configuration from environment");

    let node = Node::start_local(config).await;

    // Run this until [CTRL] + [C] got pressed or something went wrong
    tokio::select! {
        _ = tokio::signal::ctrl_c() => (),
        _ = node.on_exit() => (),
    }

    // Wait until all tasks are gracefully shut down and exit
    node.shutdown().await;
}

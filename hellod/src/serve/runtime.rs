/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use log::{info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::{HelloServer, ServerQuitCommand};

pub(super) struct HelloServerRuntime {
    server: Arc<HelloServer>,
}

impl HelloServerRuntime {
    pub(super) fn new(server: &Arc<HelloServer>) -> Self {
        HelloServerRuntime {
            server: Arc::clone(server),
        }
    }

    async fn run(
        self,
        listener: TcpListener,
        mut quit_receiver: broadcast::Receiver<ServerQuitCommand>,
    ) -> anyhow::Result<()> {
        use broadcast::error::RecvError;

        let local_addr = listener
            .local_addr()
            .context("failed to get bound local address")?;
        info!("server online at {local_addr}");

        loop {
            tokio::select! {
                biased;

                ev = quit_receiver.recv() => {
                    match ev {
                        Ok(ServerQuitCommand::QuitRuntime) | Err(RecvError::Closed) => {
                            info!("server at {local_addr} will go offline");
                            return Ok(());
                        }
                        Err(RecvError::Lagged(dropped)) => {
                            warn!("quit notify channel overflowed, {dropped} msg dropped");
                            continue;
                        }
                    }
                }
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            self.server.get_server_stats().add_conn();
                            self.run_task(stream, peer_addr, local_addr);
                        }
                        Err(e) => {
                            return Err(anyhow!("accept failed on {local_addr}: {e}"));
                        }
                    }
                }
            }
        }
    }

    fn run_task(&self, stream: TcpStream, peer_addr: SocketAddr, local_addr: SocketAddr) {
        let server = Arc::clone(&self.server);
        tokio::spawn(async move {
            server.run_tcp_task(stream, peer_addr, local_addr).await;
        });
    }

    pub(super) fn into_running(
        self,
        listener: std::net::TcpListener,
        quit_sender: &broadcast::Sender<ServerQuitCommand>,
    ) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
        let listener =
            TcpListener::from_std(listener).context("failed to convert listen socket")?;
        let quit_receiver = quit_sender.subscribe();
        Ok(tokio::spawn(
            async move { self.run(listener, quit_receiver).await },
        ))
    }
}

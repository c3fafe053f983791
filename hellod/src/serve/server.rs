/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use log::info;
use slog::Logger;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

use hello_tls::{ServerTlsConfig, ServerTlsConfigBuilder, load_certs, load_identity};

use super::{HelloServerRuntime, HelloServerStats, HelloTask, HelloTaskContext, ServerQuitCommand};
use crate::auth::AuthService;

#[derive(Debug, Clone)]
pub struct HelloServerConfig {
    pub listen_addr: SocketAddr,
    pub ca_cert: PathBuf,
    pub tls_cert: PathBuf,
    pub tls_key: PathBuf,
}

impl HelloServerConfig {
    fn build_tls(&self) -> anyhow::Result<ServerTlsConfig> {
        let mut builder = ServerTlsConfigBuilder::default();
        builder.set_ca_certificates(
            load_certs(&self.ca_cert).context("failed to load trusted ca certs")?,
        );
        builder.set_cert_pair(
            load_identity(&self.tls_cert, &self.tls_key)
                .context("failed to load server identity")?,
        );
        builder.build().context("failed to build tls server config")
    }
}

pub struct HelloServer {
    config: Arc<HelloServerConfig>,
    server_stats: Arc<HelloServerStats>,
    tls_acceptor: TlsAcceptor,
    accept_timeout: Duration,
    auth: Arc<AuthService>,
    quit_sender: broadcast::Sender<ServerQuitCommand>,
    task_logger: Logger,
}

impl HelloServer {
    /// Load trust material, open the service trees and build the server.
    /// Everything that can fail does so here, before any socket is bound.
    pub fn prepare(config: HelloServerConfig, db: &sled::Db) -> anyhow::Result<Self> {
        let tls = config.build_tls()?;

        let auth = AuthService::new(db)?;
        if auth.seed_default_user()? {
            info!("seeded default demo user");
        }

        let task_logger = slog_scope::logger().new(slog::o!("server" => "hello"));

        Ok(HelloServer {
            config: Arc::new(config),
            server_stats: Arc::new(HelloServerStats::default()),
            tls_acceptor: TlsAcceptor::from(tls.driver),
            accept_timeout: tls.accept_timeout,
            auth: Arc::new(auth),
            quit_sender: broadcast::Sender::new(16),
            task_logger,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.config.listen_addr
    }

    pub fn get_server_stats(&self) -> Arc<HelloServerStats> {
        self.server_stats.clone()
    }

    pub fn alive_count(&self) -> i32 {
        self.server_stats.get_alive_count()
    }

    /// Bind the listen socket and spawn the accept loop. Returns the bound
    /// local address and the runtime handle; the handle resolves with an
    /// error if the accept loop itself fails.
    pub fn start_runtime(
        self: &Arc<Self>,
    ) -> anyhow::Result<(SocketAddr, JoinHandle<anyhow::Result<()>>)> {
        let listener = std::net::TcpListener::bind(self.config.listen_addr).context(format!(
            "failed to bind listen socket to {}",
            self.config.listen_addr
        ))?;
        listener
            .set_nonblocking(true)
            .context("failed to set listen socket nonblocking")?;
        let local_addr = listener
            .local_addr()
            .context("failed to get bound local address")?;

        let handle = HelloServerRuntime::new(self).into_running(listener, &self.quit_sender)?;
        self.server_stats.set_online();
        Ok((local_addr, handle))
    }

    pub fn abort_runtime(&self) {
        let _ = self.quit_sender.send(ServerQuitCommand::QuitRuntime);
        self.server_stats.set_offline();
    }

    pub(super) async fn run_tcp_task(
        &self,
        stream: TcpStream,
        peer_addr: SocketAddr,
        local_addr: SocketAddr,
    ) {
        let tls_stream =
            match tokio::time::timeout(self.accept_timeout, self.tls_acceptor.accept(stream)).await
            {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => {
                    self.server_stats.add_handshake_failed();
                    slog::info!(self.task_logger, "rejected connection from {peer_addr}: {e}");
                    return;
                }
                Err(_) => {
                    self.server_stats.add_handshake_failed();
                    slog::info!(
                        self.task_logger,
                        "tls handshake timeout for connection from {peer_addr}"
                    );
                    return;
                }
            };

        let ctx = HelloTaskContext {
            server_stats: self.server_stats.clone(),
            auth: self.auth.clone(),
            peer_addr,
            local_addr,
            task_logger: self.task_logger.clone(),
            quit_notifier: self.quit_sender.subscribe(),
        };

        let (r, w) = tokio::io::split(tls_stream);
        HelloTask::new(ctx).into_running(r, w).await
    }
}

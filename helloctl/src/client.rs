/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::anyhow;
use rustls_pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use hello_proto::{HelloRequest, HelloResponse, HelloResponsePayload, ServingStatus};
use hello_tls::{ClientTlsConfig, ClientTlsConfigBuilder};

pub(crate) struct HelloClientConfigBuilder {
    server_addr: SocketAddr,
    tls_client: ClientTlsConfigBuilder,
    tls_name: Option<ServerName<'static>>,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl HelloClientConfigBuilder {
    pub(crate) fn new(server_addr: SocketAddr) -> Self {
        HelloClientConfigBuilder {
            server_addr,
            tls_client: ClientTlsConfigBuilder::default(),
            tls_name: None,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(4),
        }
    }

    pub(crate) fn set_tls_client(&mut self, tls: ClientTlsConfigBuilder) {
        self.tls_client = tls;
    }

    pub(crate) fn set_tls_name(&mut self, name: ServerName<'static>) {
        self.tls_name = Some(name);
    }

    pub(crate) fn build(&self) -> anyhow::Result<HelloClientConfig> {
        let tls_client = self.tls_client.build()?;
        let tls_name = match &self.tls_name {
            Some(name) => name.clone(),
            None => ServerName::IpAddress(self.server_addr.ip().into()),
        };
        Ok(HelloClientConfig {
            server_addr: self.server_addr,
            tls_client,
            tls_name,
            connect_timeout: self.connect_timeout,
            request_timeout: self.request_timeout,
        })
    }
}

pub(crate) struct HelloClientConfig {
    server_addr: SocketAddr,
    tls_client: ClientTlsConfig,
    tls_name: ServerName<'static>,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl HelloClientConfig {
    /// Establish the mutually authenticated channel. All later calls are
    /// carried over the returned connection.
    pub(crate) async fn connect(&self) -> anyhow::Result<HelloConnection> {
        let stream = match tokio::time::timeout(
            self.connect_timeout,
            TcpStream::connect(self.server_addr),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(anyhow!("failed to connect to {}: {e}", self.server_addr)),
            Err(_) => return Err(anyhow!("timeout to connect to {}", self.server_addr)),
        };

        let tls_connector = TlsConnector::from(self.tls_client.driver.clone());
        let tls_stream = match tokio::time::timeout(
            self.tls_client.handshake_timeout,
            tls_connector.connect(self.tls_name.clone(), stream),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(anyhow!(
                    "failed to tls handshake with {}: {e}",
                    self.server_addr
                ));
            }
            Err(_) => {
                return Err(anyhow!("timeout to tls handshake with {}", self.server_addr));
            }
        };

        Ok(HelloConnection {
            stream: tls_stream,
            request_timeout: self.request_timeout,
            next_msg_id: 1,
        })
    }
}

pub(crate) struct HelloConnection {
    stream: TlsStream<TcpStream>,
    request_timeout: Duration,
    next_msg_id: u32,
}

impl HelloConnection {
    fn next_id(&mut self) -> u32 {
        let id = self.next_msg_id;
        self.next_msg_id = self.next_msg_id.wrapping_add(1);
        id
    }

    async fn call(&mut self, req: HelloRequest) -> anyhow::Result<HelloResponse> {
        match tokio::time::timeout(self.request_timeout, self.exchange(&req)).await {
            Ok(r) => r,
            Err(_) => Err(anyhow!("{} request timeout", req.op().as_str())),
        }
    }

    async fn exchange(&mut self, req: &HelloRequest) -> anyhow::Result<HelloResponse> {
        req.send(&mut self.stream)
            .await
            .map_err(|e| anyhow!("failed to send request: {e}"))?;
        let rsp = HelloResponse::recv(&mut self.stream)
            .await
            .map_err(|e| anyhow!("failed to recv response: {e}"))?;
        if rsp.id != req.id {
            return Err(anyhow!(
                "response id {} does not match request id {}",
                rsp.id,
                req.id
            ));
        }
        Ok(rsp)
    }

    pub(crate) async fn login(
        &mut self,
        username: &str,
        password: &str,
    ) -> anyhow::Result<String> {
        let id = self.next_id();
        let rsp = self.call(HelloRequest::login(id, username, password)).await?;
        match rsp.payload {
            HelloResponsePayload::Token(token) => {
                if token.is_empty() {
                    Err(anyhow!("server returned an empty token"))
                } else {
                    Ok(token)
                }
            }
            HelloResponsePayload::Error(code) => Err(anyhow!("login rejected: {code}")),
            _ => Err(anyhow!("unexpected response payload for login")),
        }
    }

    pub(crate) async fn say(&mut self, name: &str) -> anyhow::Result<String> {
        let id = self.next_id();
        let rsp = self.call(HelloRequest::say(id, name)).await?;
        match rsp.payload {
            HelloResponsePayload::Message(message) => Ok(message),
            HelloResponsePayload::Error(code) => Err(anyhow!("say failed: {code}")),
            _ => Err(anyhow!("unexpected response payload for say")),
        }
    }

    pub(crate) async fn check(&mut self, service: &str) -> anyhow::Result<ServingStatus> {
        let id = self.next_id();
        let rsp = self.call(HelloRequest::check(id, service)).await?;
        match rsp.payload {
            HelloResponsePayload::Status(status) => Ok(status),
            HelloResponsePayload::Error(code) => Err(anyhow!("check failed: {code}")),
            _ => Err(anyhow!("unexpected response payload for check")),
        }
    }
}

/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Plaintext HTTP introspection endpoint.
//!
//! Serves a JSON stats snapshot to ANY requester without authorization,
//! which is why it only runs when insecure debug mode is explicitly enabled
//! on the command line. An error on this listener takes the whole process
//! down.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use log::warn;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::serve::HelloServerStats;

const MAX_REQUEST_HEAD_SIZE: usize = 1024;

pub fn spawn(
    listen_addr: SocketAddr,
    stats: Arc<HelloServerStats>,
) -> JoinHandle<anyhow::Result<()>> {
    tokio::spawn(run(listen_addr, stats))
}

async fn run(listen_addr: SocketAddr, stats: Arc<HelloServerStats>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(listen_addr).await.context(format!(
        "failed to bind debug listen socket to {listen_addr}"
    ))?;
    warn!("insecure debug endpoint enabled at {listen_addr}, requests are not authorized");

    loop {
        let (stream, _peer_addr) = listener
            .accept()
            .await
            .context("debug listener accept failed")?;
        let stats = stats.clone();
        tokio::spawn(async move {
            let _ = handle_connection(stream, stats).await;
        });
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    stats: Arc<HelloServerStats>,
) -> std::io::Result<()> {
    let mut buf = [0u8; MAX_REQUEST_HEAD_SIZE];
    let mut filled = 0usize;
    loop {
        if filled >= buf.len() {
            break;
        }
        let nr = stream.read(&mut buf[filled..]).await?;
        if nr == 0 {
            break;
        }
        filled += nr;
        if buf[..filled].windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    let head = String::from_utf8_lossy(&buf[..filled]);
    let mut request_line = head.lines().next().unwrap_or("").split_whitespace();
    let method = request_line.next().unwrap_or("");
    let path = request_line.next().unwrap_or("");

    let (status_line, body) = if method == "GET" && path == "/debug/stats" {
        ("200 OK", stats_json(&stats))
    } else {
        ("404 Not Found", "{}".to_string())
    };

    let response = format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

fn stats_json(stats: &HelloServerStats) -> String {
    let mut health = serde_json::Map::new();
    for (service, status) in crate::health::snapshot() {
        health.insert(service, serde_json::Value::String(status.to_string()));
    }

    serde_json::json!({
        "server": {
            "online": stats.is_online(),
            "conn_total": stats.get_conn_total(),
            "handshake_failed_total": stats.get_handshake_failed_total(),
            "task_total": stats.get_task_total(),
            "task_alive_count": stats.get_alive_count(),
        },
        "request": {
            "login_total": stats.get_login_total(),
            "login_failed_total": stats.get_login_failed_total(),
            "say_total": stats.get_say_total(),
            "check_total": stats.get_check_total(),
            "check_not_found_total": stats.get_check_not_found_total(),
            "invalid_request_total": stats.get_invalid_request_total(),
        },
        "health": health,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_json_shape() {
        let stats = HelloServerStats::default();
        let v: serde_json::Value = serde_json::from_str(&stats_json(&stats)).unwrap();
        assert_eq!(v["server"]["conn_total"], 0);
        assert_eq!(v["request"]["login_total"], 0);
        assert!(v["health"].is_object());
    }
}

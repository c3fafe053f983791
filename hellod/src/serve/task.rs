/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::sync::Arc;

use slog::Logger;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::broadcast;
use uuid::Uuid;

use hello_proto::{
    HelloErrorCode, HelloFrame, HelloRequestError, HelloRequestPayload, HelloResponse,
};

use super::{HelloServerStats, ServerQuitCommand, ServerTaskError};
use crate::auth::{AuthError, AuthService};

pub(crate) struct HelloTaskContext {
    pub(crate) server_stats: Arc<HelloServerStats>,
    pub(crate) auth: Arc<AuthService>,
    pub(crate) peer_addr: SocketAddr,
    pub(crate) local_addr: SocketAddr,
    pub(crate) task_logger: Logger,
    pub(crate) quit_notifier: broadcast::Receiver<ServerQuitCommand>,
}

pub(crate) struct HelloTask {
    ctx: HelloTaskContext,
    logger: Logger,
}

impl Drop for HelloTask {
    fn drop(&mut self) {
        self.ctx.server_stats.dec_alive_task();
    }
}

impl HelloTask {
    pub(crate) fn new(ctx: HelloTaskContext) -> Self {
        ctx.server_stats.add_task();
        ctx.server_stats.inc_alive_task();
        let task_id = Uuid::new_v4();
        let logger = ctx.task_logger.new(slog::o!(
            "task_id" => task_id.simple().to_string(),
            "peer_addr" => ctx.peer_addr.to_string(),
            "local_addr" => ctx.local_addr.to_string(),
        ));
        HelloTask { ctx, logger }
    }

    pub(crate) async fn into_running<R, W>(mut self, mut reader: R, mut writer: W)
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        slog::debug!(self.logger, "client connected");

        loop {
            tokio::select! {
                biased;

                r = self.ctx.quit_notifier.recv() => {
                    match r {
                        Ok(ServerQuitCommand::QuitRuntime)
                        | Err(broadcast::error::RecvError::Closed) => {
                            slog::debug!(self.logger, "{}", ServerTaskError::ServerForceQuit);
                            break;
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                    }
                }
                r = HelloFrame::recv(&mut reader) => {
                    match r {
                        Ok(frame) => {
                            if let Err(e) = self.handle_frame(&mut writer, frame).await {
                                slog::info!(self.logger, "{e}");
                                break;
                            }
                        }
                        Err(HelloRequestError::ClosedByPeer) => {
                            slog::debug!(self.logger, "client disconnected");
                            break;
                        }
                        Err(e) => {
                            slog::info!(self.logger, "{}", ServerTaskError::from(e));
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn handle_frame<W>(&self, writer: &mut W, frame: HelloFrame) -> Result<(), ServerTaskError>
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let rsp = match frame.parse() {
            Ok(req) => self.process(req.id, req.payload),
            Err(e) => {
                // the frame boundary is intact, answer and keep the connection
                self.ctx.server_stats.add_invalid_request();
                slog::info!(self.logger, "{}", ServerTaskError::InvalidRequest(e));
                HelloResponse::error(frame.id, HelloErrorCode::BadRequest)
            }
        };

        if let Some(code) = rsp.error_code() {
            slog::debug!(self.logger, "request {} failed: {code}", rsp.id);
        }

        rsp.send(writer)
            .await
            .map_err(ServerTaskError::WriteFailed)
    }

    fn process(&self, id: u32, payload: HelloRequestPayload) -> HelloResponse {
        match payload {
            HelloRequestPayload::Login { username, password } => {
                self.ctx.server_stats.add_login();
                match self.ctx.auth.login(&username, &password) {
                    Ok(token) => HelloResponse::token(id, token),
                    Err(AuthError::Rejected) => {
                        self.ctx.server_stats.add_login_failed();
                        slog::info!(self.logger, "login rejected for user {username}");
                        HelloResponse::error(id, HelloErrorCode::AuthFailed)
                    }
                    Err(AuthError::Store(e)) => {
                        slog::error!(self.logger, "login store access failed: {e}");
                        HelloResponse::error(id, HelloErrorCode::Internal)
                    }
                }
            }
            HelloRequestPayload::Say { name } => {
                self.ctx.server_stats.add_say();
                HelloResponse::message(id, crate::greet::say(&name))
            }
            HelloRequestPayload::Check { service } => {
                self.ctx.server_stats.add_check();
                match crate::health::check(&service) {
                    Some(status) => HelloResponse::status(id, status),
                    None => {
                        self.ctx.server_stats.add_check_not_found();
                        HelloResponse::error(id, HelloErrorCode::NotFound)
                    }
                }
            }
        }
    }
}

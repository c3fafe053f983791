/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use anyhow::{Context, anyhow};
use log::{error, info};

use hello_proto::ServingStatus;
use hellod::opts::ProcArgs;
use hellod::serve::{HelloServer, HelloServerConfig};

fn main() -> anyhow::Result<()> {
    let Some(proc_args) =
        hellod::opts::parse_clap().context("failed to parse command line options")?
    else {
        return Ok(());
    };

    let _log_guard =
        hello_stdlog::setup(proc_args.verbose_level).context("failed to setup logger")?;

    rustls::crypto::ring::default_provider()
        .install_default()
        .unwrap();

    let ret = tokio_run(&proc_args);

    match ret {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("{e:?}");
            Err(e)
        }
    }
}

fn tokio_run(args: &ProcArgs) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to start runtime: {e}"))?;
    rt.block_on(async {
        hellod::store::open(&args.db_path).context("failed to open data store")?;
        let db = hellod::store::get()?;

        let config = HelloServerConfig {
            listen_addr: args.listen_addr,
            ca_cert: args.ca_cert.clone(),
            tls_cert: args.tls_cert.clone(),
            tls_key: args.tls_key.clone(),
        };
        let server =
            Arc::new(HelloServer::prepare(config, db).context("failed to prepare server")?);

        hellod::health::set_serving_status(hellod::HELLO_SERVICE_NAME, ServingStatus::Serving);

        let (local_addr, mut serve_handle) =
            server.start_runtime().context("failed to start server")?;
        info!("serving on {local_addr}");

        let mut debug_handle = if args.insecure_debug {
            Some(hellod::debug::spawn(
                args.debug_listen_addr,
                server.get_server_stats(),
            ))
        } else {
            None
        };

        let debug_wait = async {
            match debug_handle.as_mut() {
                Some(handle) => handle.await,
                None => {
                    std::future::pending::<Result<anyhow::Result<()>, tokio::task::JoinError>>()
                        .await
                }
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                server.abort_runtime();
            }
            r = &mut serve_handle => {
                return match r {
                    Ok(Ok(_)) => Err(anyhow!("server runtime quit unexpectedly")),
                    Ok(Err(e)) => Err(e).context("server runtime failed"),
                    Err(e) => Err(anyhow!("server runtime join failed: {e}")),
                };
            }
            r = debug_wait => {
                return match r {
                    Ok(Ok(_)) => Err(anyhow!("debug listener quit unexpectedly")),
                    Ok(Err(e)) => Err(e).context("debug listener failed"),
                    Err(e) => Err(anyhow!("debug listener join failed: {e}")),
                };
            }
        }

        hellod::store::flush().context("failed to flush data store")?;
        Ok(())
    })
}

/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};
use log::{error, info};
use rustls_pki_types::ServerName;

use hello_tls::{ClientTlsConfigBuilder, load_certs, load_identity};

mod build;
mod client;
mod opts;

use client::HelloClientConfigBuilder;
use opts::ProcArgs;

fn main() -> anyhow::Result<()> {
    let Some(proc_args) = opts::parse_clap().context("failed to parse command line options")?
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
        let mut tls_builder = ClientTlsConfigBuilder::default();
        tls_builder.set_ca_certificates(
            load_certs(&args.ca_cert).context("failed to load trusted ca certs")?,
        );
        tls_builder.set_cert_pair(
            load_identity(&args.tls_cert, &args.tls_key)
                .context("failed to load client identity")?,
        );

        let mut config_builder = HelloClientConfigBuilder::new(args.server_addr);
        config_builder.set_tls_client(tls_builder);
        if let Some(name) = &args.tls_name {
            let tls_name = ServerName::try_from(name.clone())
                .map_err(|e| anyhow!("invalid tls server name {name}: {e}"))?;
            config_builder.set_tls_name(tls_name);
        }
        let client = config_builder
            .build()
            .context("failed to build tls client config")?;

        let mut conn = client
            .connect()
            .await
            .context("failed to establish secure channel")?;

        let token = conn
            .login(&args.username, &args.password)
            .await
            .context("login failed")?;
        info!("{token}");

        let message = conn.say(&args.name).await.context("say failed")?;
        info!("{message}");

        info!("starting health check..");
        let status = conn
            .check(&args.service)
            .await
            .context("health check failed")?;
        info!("status: {status}");

        Ok(())
    })
}

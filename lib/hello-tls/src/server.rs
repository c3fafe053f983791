/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use rustls::RootCertStore;
use rustls::ServerConfig;
use rustls::server::WebPkiClientVerifier;
use rustls_pki_types::CertificateDer;

use super::CertificatePair;

#[derive(Clone)]
pub struct ServerTlsConfig {
    pub driver: Arc<ServerConfig>,
    pub accept_timeout: Duration,
}

/// Build a server side TLS config that requires and verifies a client
/// certificate against the configured CA certs on every inbound connection.
pub struct ServerTlsConfigBuilder {
    cert_pair: Option<CertificatePair>,
    ca_certs: Vec<CertificateDer<'static>>,
    accept_timeout: Duration,
}

impl Default for ServerTlsConfigBuilder {
    fn default() -> Self {
        ServerTlsConfigBuilder {
            cert_pair: None,
            ca_certs: Vec::new(),
            accept_timeout: Duration::from_secs(10),
        }
    }
}

impl ServerTlsConfigBuilder {
    pub fn set_cert_pair(&mut self, cert_pair: CertificatePair) {
        self.cert_pair = Some(cert_pair);
    }

    pub fn set_ca_certificates(&mut self, certs: Vec<CertificateDer<'static>>) {
        self.ca_certs = certs;
    }

    pub fn set_accept_timeout(&mut self, timeout: Duration) {
        self.accept_timeout = timeout;
    }

    pub fn check(&self) -> anyhow::Result<()> {
        if self.cert_pair.is_none() {
            return Err(anyhow!("no cert pair is set"));
        }
        if self.ca_certs.is_empty() {
            return Err(anyhow!("no ca certificate is set"));
        }
        Ok(())
    }

    pub fn build(&self) -> anyhow::Result<ServerTlsConfig> {
        self.check()?;
        let Some(cert_pair) = &self.cert_pair else {
            return Err(anyhow!("no cert pair is set"));
        };

        let mut root_store = RootCertStore::empty();
        for (i, cert) in self.ca_certs.iter().enumerate() {
            root_store.add(cert.clone()).map_err(|e| {
                anyhow!("failed to add cert {i} as root certs for client auth: {e:?}")
            })?;
        }
        let client_verifier = WebPkiClientVerifier::builder(Arc::new(root_store))
            .build()
            .map_err(|e| anyhow!("failed to build client cert verifier: {e}"))?;

        let config = ServerConfig::builder()
            .with_client_cert_verifier(client_verifier)
            .with_single_cert(cert_pair.certs_owned(), cert_pair.key_owned())
            .map_err(|e| anyhow!("failed to set server cert pair: {e:?}"))?;

        Ok(ServerTlsConfig {
            driver: Arc::new(config),
            accept_timeout: self.accept_timeout,
        })
    }
}

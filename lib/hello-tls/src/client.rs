/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use rustls::ClientConfig;
use rustls::RootCertStore;
use rustls_pki_types::CertificateDer;

use super::CertificatePair;

#[derive(Clone)]
pub struct ClientTlsConfig {
    pub driver: Arc<ClientConfig>,
    pub handshake_timeout: Duration,
}

/// Build a client side TLS config that verifies the server against the
/// configured CA certs and presents the configured identity to the server.
pub struct ClientTlsConfigBuilder {
    ca_certs: Vec<CertificateDer<'static>>,
    cert_pair: Option<CertificatePair>,
    handshake_timeout: Duration,
}

impl Default for ClientTlsConfigBuilder {
    fn default() -> Self {
        ClientTlsConfigBuilder {
            ca_certs: Vec::new(),
            cert_pair: None,
            handshake_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientTlsConfigBuilder {
    pub fn set_ca_certificates(&mut self, certs: Vec<CertificateDer<'static>>) {
        self.ca_certs = certs;
    }

    pub fn set_cert_pair(&mut self, cert_pair: CertificatePair) {
        self.cert_pair = Some(cert_pair);
    }

    pub fn set_handshake_timeout(&mut self, timeout: Duration) {
        self.handshake_timeout = timeout;
    }

    pub fn check(&self) -> anyhow::Result<()> {
        if self.ca_certs.is_empty() {
            return Err(anyhow!("no ca certificate is set"));
        }
        Ok(())
    }

    pub fn build(&self) -> anyhow::Result<ClientTlsConfig> {
        self.check()?;

        let mut root_store = RootCertStore::empty();
        for (i, cert) in self.ca_certs.iter().enumerate() {
            root_store
                .add(cert.clone())
                .map_err(|e| anyhow!("failed to add ca cert {i} as root cert: {e:?}"))?;
        }

        let config_builder = ClientConfig::builder().with_root_certificates(root_store);
        let config = match &self.cert_pair {
            Some(pair) => config_builder
                .with_client_auth_cert(pair.certs_owned(), pair.key_owned())
                .map_err(|e| anyhow!("failed to set client auth cert pair: {e:?}"))?,
            None => config_builder.with_no_client_auth(),
        };

        Ok(ClientTlsConfig {
            driver: Arc::new(config),
            handshake_timeout: self.handshake_timeout,
        })
    }
}

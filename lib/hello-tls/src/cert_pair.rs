/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::anyhow;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};

#[derive(Default)]
pub struct CertificatePairBuilder {
    certs: Vec<CertificateDer<'static>>,
    key: Option<PrivateKeyDer<'static>>,
}

impl CertificatePairBuilder {
    pub fn set_certs(&mut self, certs: Vec<CertificateDer<'static>>) {
        self.certs = certs;
    }

    pub fn set_key(&mut self, key: PrivateKeyDer<'static>) {
        self.key = Some(key);
    }

    pub fn build(self) -> anyhow::Result<CertificatePair> {
        if self.certs.is_empty() {
            return Err(anyhow!("no certificate set"));
        }
        let Some(key) = self.key else {
            return Err(anyhow!("no private key set"));
        };
        Ok(CertificatePair {
            certs: self.certs,
            key,
        })
    }
}

#[derive(Debug)]
pub struct CertificatePair {
    certs: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

impl Clone for CertificatePair {
    fn clone(&self) -> Self {
        CertificatePair {
            certs: self.certs.clone(),
            key: self.key.clone_key(),
        }
    }
}

impl CertificatePair {
    pub fn certs_owned(&self) -> Vec<CertificateDer<'static>> {
        self.certs.clone()
    }

    pub fn key_owned(&self) -> PrivateKeyDer<'static> {
        self.key.clone_key()
    }

    pub fn into_inner(self) -> (Vec<CertificateDer<'static>>, PrivateKeyDer<'static>) {
        (self.certs, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_both_parts() {
        let builder = CertificatePairBuilder::default();
        assert!(builder.build().is_err());

        let mut builder = CertificatePairBuilder::default();
        builder.set_certs(vec![CertificateDer::from(vec![0x30, 0x00])]);
        assert!(builder.build().is_err());
    }
}

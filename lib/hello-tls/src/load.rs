/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::anyhow;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};

use super::{CertificatePair, CertificatePairBuilder};

pub fn load_certs(path: &Path) -> anyhow::Result<Vec<CertificateDer<'static>>> {
    let file =
        File::open(path).map_err(|e| anyhow!("unable to open file {}: {e}", path.display()))?;
    let mut certs = Vec::new();
    for (i, r) in rustls_pemfile::certs(&mut BufReader::new(file)).enumerate() {
        let cert = r.map_err(|e| {
            anyhow!("failed to read cert {i} from file {}: {e}", path.display())
        })?;
        certs.push(cert);
    }
    if certs.is_empty() {
        Err(anyhow!(
            "no valid certificate found in file {}",
            path.display()
        ))
    } else {
        Ok(certs)
    }
}

pub fn load_key(path: &Path) -> anyhow::Result<PrivateKeyDer<'static>> {
    use rustls_pemfile::Item;

    let file =
        File::open(path).map_err(|e| anyhow!("unable to open file {}: {e}", path.display()))?;
    match rustls_pemfile::read_one(&mut BufReader::new(file)).map_err(|e| {
        anyhow!(
            "failed to read private key from file {}: {e}",
            path.display()
        )
    })? {
        Some(Item::Pkcs8Key(d)) => Ok(PrivateKeyDer::from(d)),
        Some(Item::Pkcs1Key(d)) => Ok(PrivateKeyDer::from(d)),
        Some(Item::Sec1Key(d)) => Ok(PrivateKeyDer::from(d)),
        Some(item) => Err(anyhow!(
            "unsupported item in file {}: {item:?}",
            path.display()
        )),
        None => Err(anyhow!(
            "no valid private key found in file {}",
            path.display()
        )),
    }
}

/// Load a certificate chain and the matching private key as one identity.
pub fn load_identity(cert_path: &Path, key_path: &Path) -> anyhow::Result<CertificatePair> {
    let mut builder = CertificatePairBuilder::default();
    builder.set_certs(load_certs(cert_path)?);
    builder.set_key(load_key(key_path)?);
    builder.build()
}

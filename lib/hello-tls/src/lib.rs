/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Trust material loading and TLS config builders.
//!
//! Both sides of the hello service do standard mutual TLS: each process
//! loads a CA bundle and its own certificate/key pair once at startup, then
//! reuses the built config for every channel.

mod load;
pub use load::{load_certs, load_identity, load_key};

mod cert_pair;
pub use cert_pair::{CertificatePair, CertificatePairBuilder};

mod server;
pub use server::{ServerTlsConfig, ServerTlsConfigBuilder};

mod client;
pub use client::{ClientTlsConfig, ClientTlsConfigBuilder};

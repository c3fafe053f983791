/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Hello RPC server.
//!
//! Serves `Login`, `Say` and `Check` over a mutually authenticated TLS
//! channel. Client certificates are verified against the configured CA
//! bundle at connection time; the service layer trusts the transport.

pub mod build;
pub mod opts;

pub mod store;

pub mod auth;
pub mod greet;
pub mod health;

pub mod serve;

pub mod debug;

/// Well known health entry registered for the greeting service.
pub const HELLO_SERVICE_NAME: &str = "grpc.health.v1.helloservice";

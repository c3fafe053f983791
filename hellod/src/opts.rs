/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::env;
use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, ValueHint, value_parser};

const ARGS_VERSION: &str = "version";
const ARGS_VERBOSE: &str = "verbose";
const ARGS_LISTEN_ADDR: &str = "listen-addr";
const ARGS_CA_CERT: &str = "ca-cert";
const ARGS_TLS_CERT: &str = "tls-cert";
const ARGS_TLS_KEY: &str = "tls-key";
const ARGS_DEBUG_LISTEN_ADDR: &str = "debug-listen-addr";
const ARGS_INSECURE_DEBUG: &str = "insecure-debug";
const ARGS_DB_PATH: &str = "db-path";

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:4443";
const DEFAULT_DEBUG_LISTEN_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_DB_PATH: &str = "hello.db";

#[derive(Debug)]
pub struct ProcArgs {
    pub verbose_level: u8,
    pub listen_addr: SocketAddr,
    pub ca_cert: PathBuf,
    pub tls_cert: PathBuf,
    pub tls_key: PathBuf,
    pub debug_listen_addr: SocketAddr,
    pub insecure_debug: bool,
    pub db_path: PathBuf,
}

fn with_config_dir(file: &str) -> OsString {
    let home = env::var("HOME").unwrap_or_default();
    PathBuf::from(home)
        .join(".hello")
        .join("server")
        .join(file)
        .into_os_string()
}

fn build_cli_args() -> Command {
    Command::new(crate::build::PKG_NAME)
        .disable_version_flag(true)
        .arg(
            Arg::new(ARGS_VERBOSE)
                .help("Show verbose output")
                .num_args(0)
                .action(ArgAction::Count)
                .short('v')
                .long(ARGS_VERBOSE),
        )
        .arg(
            Arg::new(ARGS_VERSION)
                .help("Show version")
                .action(ArgAction::SetTrue)
                .short('V')
                .long(ARGS_VERSION),
        )
        .arg(
            Arg::new(ARGS_LISTEN_ADDR)
                .help("Listen address for the RPC service")
                .value_name("LOCAL ADDRESS")
                .num_args(1)
                .value_parser(value_parser!(SocketAddr))
                .default_value(DEFAULT_LISTEN_ADDR)
                .long(ARGS_LISTEN_ADDR),
        )
        .arg(
            Arg::new(ARGS_CA_CERT)
                .help("Trusted CA certificate for client auth")
                .value_name("CA CERTIFICATE FILE")
                .num_args(1)
                .value_hint(ValueHint::FilePath)
                .value_parser(value_parser!(PathBuf))
                .default_value(with_config_dir("ca.pem"))
                .long(ARGS_CA_CERT),
        )
        .arg(
            Arg::new(ARGS_TLS_CERT)
                .help("TLS server certificate")
                .value_name("CERTIFICATE FILE")
                .num_args(1)
                .value_hint(ValueHint::FilePath)
                .value_parser(value_parser!(PathBuf))
                .default_value(with_config_dir("cert.pem"))
                .long(ARGS_TLS_CERT),
        )
        .arg(
            Arg::new(ARGS_TLS_KEY)
                .help("TLS server private key")
                .value_name("PRIVATE KEY FILE")
                .num_args(1)
                .value_hint(ValueHint::FilePath)
                .value_parser(value_parser!(PathBuf))
                .default_value(with_config_dir("key.pem"))
                .long(ARGS_TLS_KEY),
        )
        .arg(
            Arg::new(ARGS_DEBUG_LISTEN_ADDR)
                .help("Listen address for the plaintext debug endpoint")
                .value_name("LOCAL ADDRESS")
                .num_args(1)
                .value_parser(value_parser!(SocketAddr))
                .default_value(DEFAULT_DEBUG_LISTEN_ADDR)
                .long(ARGS_DEBUG_LISTEN_ADDR),
        )
        .arg(
            Arg::new(ARGS_INSECURE_DEBUG)
                .help("Enable the debug endpoint, which accepts every request without authorization")
                .action(ArgAction::SetTrue)
                .long(ARGS_INSECURE_DEBUG),
        )
        .arg(
            Arg::new(ARGS_DB_PATH)
                .help("Path of the local key-value store")
                .value_name("DB PATH")
                .num_args(1)
                .value_hint(ValueHint::AnyPath)
                .value_parser(value_parser!(PathBuf))
                .default_value(DEFAULT_DB_PATH)
                .long(ARGS_DB_PATH),
        )
}

pub fn parse_clap() -> anyhow::Result<Option<ProcArgs>> {
    let args = build_cli_args().get_matches();

    if args.get_flag(ARGS_VERSION) {
        crate::build::print_version();
        return Ok(None);
    }

    let proc_args = ProcArgs {
        verbose_level: *args.get_one::<u8>(ARGS_VERBOSE).unwrap_or(&0),
        listen_addr: *args.get_one::<SocketAddr>(ARGS_LISTEN_ADDR).unwrap(),
        ca_cert: args.get_one::<PathBuf>(ARGS_CA_CERT).unwrap().clone(),
        tls_cert: args.get_one::<PathBuf>(ARGS_TLS_CERT).unwrap().clone(),
        tls_key: args.get_one::<PathBuf>(ARGS_TLS_KEY).unwrap().clone(),
        debug_listen_addr: *args
            .get_one::<SocketAddr>(ARGS_DEBUG_LISTEN_ADDR)
            .unwrap(),
        insecure_debug: args.get_flag(ARGS_INSECURE_DEBUG),
        db_path: args.get_one::<PathBuf>(ARGS_DB_PATH).unwrap().clone(),
    };
    Ok(Some(proc_args))
}

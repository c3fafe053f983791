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
const ARGS_SERVER_ADDR: &str = "server-addr";
const ARGS_CA_CERT: &str = "ca-cert";
const ARGS_TLS_CERT: &str = "tls-cert";
const ARGS_TLS_KEY: &str = "tls-key";
const ARGS_TLS_NAME: &str = "tls-name";
const ARGS_USER: &str = "user";
const ARGS_PASSWORD: &str = "password";
const ARGS_NAME: &str = "name";
const ARGS_SERVICE: &str = "service";

const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:4443";
const DEFAULT_USER: &str = "kelseyhightower";
const DEFAULT_PASSWORD: &str = "password";
const DEFAULT_NAME: &str = "Kelsey";
const DEFAULT_SERVICE: &str = "grpc.health.v1.helloservice";

#[derive(Debug)]
pub(crate) struct ProcArgs {
    pub(crate) verbose_level: u8,
    pub(crate) server_addr: SocketAddr,
    pub(crate) ca_cert: PathBuf,
    pub(crate) tls_cert: PathBuf,
    pub(crate) tls_key: PathBuf,
    pub(crate) tls_name: Option<String>,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) name: String,
    pub(crate) service: String,
}

fn with_config_dir(file: &str) -> OsString {
    let home = env::var("HOME").unwrap_or_default();
    PathBuf::from(home)
        .join(".hello")
        .join("client")
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
            Arg::new(ARGS_SERVER_ADDR)
                .help("Hello service address")
                .value_name("SERVER ADDRESS")
                .num_args(1)
                .value_parser(value_parser!(SocketAddr))
                .default_value(DEFAULT_SERVER_ADDR)
                .long(ARGS_SERVER_ADDR),
        )
        .arg(
            Arg::new(ARGS_CA_CERT)
                .help("Trusted CA certificate to verify the server")
                .value_name("CA CERTIFICATE FILE")
                .num_args(1)
                .value_hint(ValueHint::FilePath)
                .value_parser(value_parser!(PathBuf))
                .default_value(with_config_dir("ca.pem"))
                .long(ARGS_CA_CERT),
        )
        .arg(
            Arg::new(ARGS_TLS_CERT)
                .help("TLS client certificate")
                .value_name("CERTIFICATE FILE")
                .num_args(1)
                .value_hint(ValueHint::FilePath)
                .value_parser(value_parser!(PathBuf))
                .default_value(with_config_dir("cert.pem"))
                .long(ARGS_TLS_CERT),
        )
        .arg(
            Arg::new(ARGS_TLS_KEY)
                .help("TLS client private key")
                .value_name("PRIVATE KEY FILE")
                .num_args(1)
                .value_hint(ValueHint::FilePath)
                .value_parser(value_parser!(PathBuf))
                .default_value(with_config_dir("key.pem"))
                .long(ARGS_TLS_KEY),
        )
        .arg(
            Arg::new(ARGS_TLS_NAME)
                .help("TLS verify name for the server, defaults to the server ip")
                .value_name("SERVER NAME")
                .num_args(1)
                .long(ARGS_TLS_NAME),
        )
        .arg(
            Arg::new(ARGS_USER)
                .help("Username for login")
                .value_name("USERNAME")
                .num_args(1)
                .default_value(DEFAULT_USER)
                .long(ARGS_USER),
        )
        .arg(
            Arg::new(ARGS_PASSWORD)
                .help("Password for login")
                .value_name("PASSWORD")
                .num_args(1)
                .default_value(DEFAULT_PASSWORD)
                .long(ARGS_PASSWORD),
        )
        .arg(
            Arg::new(ARGS_NAME)
                .help("Name to greet")
                .value_name("NAME")
                .num_args(1)
                .default_value(DEFAULT_NAME)
                .long(ARGS_NAME),
        )
        .arg(
            Arg::new(ARGS_SERVICE)
                .help("Service name to health check")
                .value_name("SERVICE NAME")
                .num_args(1)
                .default_value(DEFAULT_SERVICE)
                .long(ARGS_SERVICE),
        )
}

pub(crate) fn parse_clap() -> anyhow::Result<Option<ProcArgs>> {
    let args = build_cli_args().get_matches();

    if args.get_flag(ARGS_VERSION) {
        crate::build::print_version();
        return Ok(None);
    }

    let proc_args = ProcArgs {
        verbose_level: *args.get_one::<u8>(ARGS_VERBOSE).unwrap_or(&0),
        server_addr: *args.get_one::<SocketAddr>(ARGS_SERVER_ADDR).unwrap(),
        ca_cert: args.get_one::<PathBuf>(ARGS_CA_CERT).unwrap().clone(),
        tls_cert: args.get_one::<PathBuf>(ARGS_TLS_CERT).unwrap().clone(),
        tls_key: args.get_one::<PathBuf>(ARGS_TLS_KEY).unwrap().clone(),
        tls_name: args.get_one::<String>(ARGS_TLS_NAME).cloned(),
        username: args.get_one::<String>(ARGS_USER).unwrap().clone(),
        password: args.get_one::<String>(ARGS_PASSWORD).unwrap().clone(),
        name: args.get_one::<String>(ARGS_NAME).unwrap().clone(),
        service: args.get_one::<String>(ARGS_SERVICE).unwrap().clone(),
    };
    Ok(Some(proc_args))
}

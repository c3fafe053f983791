/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, SanType,
};
use rustls_pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer, ServerName};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use hello_proto::{
    HelloErrorCode, HelloRequest, HelloResponse, HelloResponsePayload, ServingStatus,
};
use hello_tls::{CertificatePairBuilder, ClientTlsConfig, ClientTlsConfigBuilder};
use hellod::serve::{HelloServer, HelloServerConfig};

struct TestCa {
    cert: Certificate,
    key: KeyPair,
}

impl TestCa {
    fn new(common_name: &str) -> Self {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.distinguished_name.push(DnType::CommonName, common_name);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let cert = params.self_signed(&key).unwrap();
        TestCa { cert, key }
    }

    fn ca_der(&self) -> CertificateDer<'static> {
        self.cert.der().clone()
    }

    fn issue_server_cert(&self) -> (Certificate, KeyPair) {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec!["localhost".to_string()]).unwrap();
        params
            .subject_alt_names
            .push(SanType::IpAddress(IpAddr::V4(Ipv4Addr::LOCALHOST)));
        params
            .extended_key_usages
            .push(ExtendedKeyUsagePurpose::ServerAuth);
        let cert = params.signed_by(&key, &self.cert, &self.key).unwrap();
        (cert, key)
    }

    fn issue_client_cert(&self) -> (Certificate, KeyPair) {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params
            .distinguished_name
            .push(DnType::CommonName, "hello test client");
        params
            .extended_key_usages
            .push(ExtendedKeyUsagePurpose::ClientAuth);
        let cert = params.signed_by(&key, &self.cert, &self.key).unwrap();
        (cert, key)
    }
}

/// Write CA bundle and server identity PEM files the way a deployment would
/// lay them out, so the server exercises its file loading path.
fn write_server_trust_files(tag: &str, ca: &TestCa) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("hellod-rpc-{}-{tag}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();

    let (server_cert, server_key) = ca.issue_server_cert();
    fs::write(dir.join("ca.pem"), ca.cert.pem()).unwrap();
    fs::write(dir.join("cert.pem"), server_cert.pem()).unwrap();
    fs::write(dir.join("key.pem"), server_key.serialize_pem()).unwrap();
    dir
}

fn client_tls_config(trusted_ca: &TestCa, identity_ca: &TestCa) -> ClientTlsConfig {
    let (client_cert, client_key) = identity_ca.issue_client_cert();
    let mut pair_builder = CertificatePairBuilder::default();
    pair_builder.set_certs(vec![client_cert.der().clone()]);
    pair_builder.set_key(PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(
        client_key.serialize_der(),
    )));

    let mut tls_builder = ClientTlsConfigBuilder::default();
    tls_builder.set_ca_certificates(vec![trusted_ca.ca_der()]);
    tls_builder.set_cert_pair(pair_builder.build().unwrap());
    tls_builder.build().unwrap()
}

fn start_server(tag: &str, ca: &TestCa) -> (Arc<HelloServer>, SocketAddr, sled::Db) {
    let dir = write_server_trust_files(tag, ca);
    let db = sled::Config::new().temporary(true).open().unwrap();

    let config = HelloServerConfig {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        ca_cert: dir.join("ca.pem"),
        tls_cert: dir.join("cert.pem"),
        tls_key: dir.join("key.pem"),
    };
    let server = Arc::new(HelloServer::prepare(config, &db).unwrap());
    hellod::health::set_serving_status(hellod::HELLO_SERVICE_NAME, ServingStatus::Serving);
    let (local_addr, _handle) = server.start_runtime().unwrap();
    (server, local_addr, db)
}

async fn connect(addr: SocketAddr, tls: &ClientTlsConfig) -> std::io::Result<TlsStream<TcpStream>> {
    let stream = TcpStream::connect(addr).await?;
    let connector = TlsConnector::from(tls.driver.clone());
    let name = ServerName::try_from("localhost").unwrap();
    connector.connect(name, stream).await
}

async fn call(
    stream: &mut TlsStream<TcpStream>,
    req: HelloRequest,
) -> anyhow::Result<HelloResponse> {
    req.send(stream).await?;
    let rsp = HelloResponse::recv(stream).await?;
    assert_eq!(rsp.id, req.id);
    Ok(rsp)
}

fn install_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

#[tokio::test]
async fn session_end_to_end() {
    install_provider();
    let ca = TestCa::new("hello e2e ca");
    let (server, addr, _db) = start_server("e2e", &ca);
    let tls = client_tls_config(&ca, &ca);

    let mut stream = connect(addr, &tls).await.unwrap();

    let rsp = call(
        &mut stream,
        HelloRequest::login(1, "kelseyhightower", "password"),
    )
    .await
    .unwrap();
    match rsp.payload {
        HelloResponsePayload::Token(token) => assert!(!token.is_empty()),
        other => panic!("unexpected login response: {other:?}"),
    }

    let rsp = call(&mut stream, HelloRequest::say(2, "Kelsey")).await.unwrap();
    assert_eq!(
        rsp.payload,
        HelloResponsePayload::Message("Hello Kelsey".to_string())
    );

    let rsp = call(
        &mut stream,
        HelloRequest::check(3, "grpc.health.v1.helloservice"),
    )
    .await
    .unwrap();
    assert_eq!(
        rsp.payload,
        HelloResponsePayload::Status(ServingStatus::Serving)
    );

    let rsp = call(&mut stream, HelloRequest::check(4, "nonexistent-service"))
        .await
        .unwrap();
    assert_eq!(rsp.error_code(), Some(HelloErrorCode::NotFound));

    server.abort_runtime();
}

#[tokio::test]
async fn two_logins_both_succeed() {
    install_provider();
    let ca = TestCa::new("hello relogin ca");
    let (server, addr, _db) = start_server("relogin", &ca);
    let tls = client_tls_config(&ca, &ca);

    let mut s1 = connect(addr, &tls).await.unwrap();
    let mut s2 = connect(addr, &tls).await.unwrap();

    for stream in [&mut s1, &mut s2] {
        let rsp = call(stream, HelloRequest::login(1, "kelseyhightower", "password"))
            .await
            .unwrap();
        match rsp.payload {
            HelloResponsePayload::Token(token) => assert!(!token.is_empty()),
            other => panic!("unexpected login response: {other:?}"),
        }
    }

    server.abort_runtime();
}

#[tokio::test]
async fn bad_credentials_rejected_per_call() {
    install_provider();
    let ca = TestCa::new("hello badcred ca");
    let (server, addr, _db) = start_server("badcred", &ca);
    let tls = client_tls_config(&ca, &ca);

    let mut stream = connect(addr, &tls).await.unwrap();

    let rsp = call(
        &mut stream,
        HelloRequest::login(1, "kelseyhightower", "wrong"),
    )
    .await
    .unwrap();
    assert_eq!(rsp.error_code(), Some(HelloErrorCode::AuthFailed));

    // the connection survives a rejected login
    let rsp = call(&mut stream, HelloRequest::say(2, "again")).await.unwrap();
    assert_eq!(
        rsp.payload,
        HelloResponsePayload::Message("Hello again".to_string())
    );

    server.abort_runtime();
}

#[tokio::test]
async fn malformed_request_gets_bad_request() {
    install_provider();
    let ca = TestCa::new("hello badreq ca");
    let (server, addr, _db) = start_server("badreq", &ca);
    let tls = client_tls_config(&ca, &ca);

    let mut stream = connect(addr, &tls).await.unwrap();

    // a well framed check request with the service item missing
    let mut buf = vec![1u8, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x09];
    buf.extend_from_slice(&[0x10, 0x00, 0x01, 0x03]);
    stream.write_all(&buf).await.unwrap();
    stream.flush().await.unwrap();

    let rsp = HelloResponse::recv(&mut stream).await.unwrap();
    assert_eq!(rsp.id, 9);
    assert_eq!(rsp.error_code(), Some(HelloErrorCode::BadRequest));

    server.abort_runtime();
}

#[tokio::test]
async fn untrusted_client_rejected_acceptor_survives() {
    install_provider();
    let ca = TestCa::new("hello mtls ca");
    let evil_ca = TestCa::new("hello evil ca");
    let (server, addr, _db) = start_server("mtls", &ca);

    // trusts the real CA for the server side, but presents an identity the
    // server's trust bundle does not cover
    let bad_tls = client_tls_config(&ca, &evil_ca);
    let attempt = async {
        let mut stream = connect(addr, &bad_tls).await?;
        let req = HelloRequest::say(1, "intruder");
        req.send(&mut stream).await?;
        HelloResponse::recv(&mut stream)
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))
    };
    assert!(attempt.await.is_err());

    // a certificate chained to the trust bundle still gets through
    let good_tls = client_tls_config(&ca, &ca);
    let mut stream = connect(addr, &good_tls).await.unwrap();
    let rsp = call(&mut stream, HelloRequest::say(1, "Kelsey")).await.unwrap();
    assert_eq!(
        rsp.payload,
        HelloResponsePayload::Message("Hello Kelsey".to_string())
    );

    server.abort_runtime();
}

#[tokio::test]
async fn client_rejects_untrusted_server() {
    install_provider();
    let ca = TestCa::new("hello server ca");
    let evil_ca = TestCa::new("hello client-only ca");
    let (server, addr, _db) = start_server("srvtrust", &ca);

    // the client's trust bundle does not cover the server's certificate
    let tls = client_tls_config(&evil_ca, &ca);
    let r = connect(addr, &tls).await;
    assert!(r.is_err());

    server.abort_runtime();
}

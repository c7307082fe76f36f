//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio_rustls::rustls::crypto::ring;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

use https_relay::config::RelayConfig;
use https_relay::relay::{DispatchError, OutboundRequest, RelayPipeline, Upstream, UpstreamResponse};
use https_relay::{HttpServer, Shutdown};

/// Config with the given allow-list and a short timeout.
pub fn config(allowed: &[&str]) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1".into();
    config.relay.allowed_domains = allowed.iter().map(|s| s.to_string()).collect();
    config.relay.request_timeout_secs = 1;
    config
}

/// Start the relay with the real HTTPS client on an ephemeral port.
pub async fn spawn_relay(config: RelayConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config).unwrap();
    serve(server).await
}

/// Start the relay around a scripted upstream.
pub async fn spawn_scripted_relay(config: RelayConfig, upstream: ScriptedUpstream) -> (SocketAddr, Shutdown) {
    let pipeline = RelayPipeline::with_upstream(&config.relay, upstream).unwrap();
    serve(HttpServer::with_pipeline(config, pipeline)).await
}

async fn serve(server: HttpServer) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// A port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Accepts connections and never answers; every socket is held open.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// Answers every connection with plaintext HTTP, which a TLS client cannot accept.
pub async fn start_plaintext_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                // Consume the ClientHello so closing does not reset the connection.
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok")
                    .await;
                tokio::time::sleep(Duration::from_millis(500)).await;
            });
        }
    });

    addr
}

/// Serves HTTPS with a freshly generated self-signed certificate that no
/// client trust store accepts.
pub async fn start_self_signed_backend() -> SocketAddr {
    let certified =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string(), "127.0.0.1".to_string()]).unwrap();
    let cert = certified.cert.der().clone();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(certified.key_pair.serialize_der()));

    let provider = Arc::new(ring::default_provider());
    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![cert], key)
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                // The relay aborts the handshake; a completed one would still answer.
                if let Ok(mut tls) = acceptor.accept(socket).await {
                    let _ = tls
                        .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok")
                        .await;
                }
            });
        }
    });

    addr
}

/// Upstream that records requests and replies from a fixed script.
#[derive(Clone)]
pub struct ScriptedUpstream {
    reply: Result<UpstreamResponse, DispatchError>,
    seen: Arc<Mutex<Vec<OutboundRequest>>>,
}

impl ScriptedUpstream {
    pub fn replying(status: u16, headers: &[(&'static str, &'static str)], body: &'static [u8]) -> Self {
        let mut map = HeaderMap::new();
        for (k, v) in headers {
            map.append(*k, v.parse().unwrap());
        }
        Self {
            reply: Ok(UpstreamResponse {
                status: StatusCode::from_u16(status).unwrap(),
                headers: map,
                body: Bytes::from_static(body),
            }),
            seen: Arc::default(),
        }
    }

    pub fn failing(error: DispatchError) -> Self {
        Self {
            reply: Err(error),
            seen: Arc::default(),
        }
    }

    pub fn seen(&self) -> Vec<OutboundRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Upstream for ScriptedUpstream {
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, DispatchError> {
        self.seen.lock().unwrap().push(request);
        self.reply.clone()
    }
}

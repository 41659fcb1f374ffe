use axum::{routing::get, Extension, Router};
use ecom_api::{common_routes, middleware, middleware::ClientIp, server, ServerConfig};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const REQUEST: &[u8] = b"GET /health HTTP/1.1\r\nHost: localhost\r\n\r\n";

async fn whoami(Extension(ClientIp(ip)): Extension<ClientIp>) -> String {
    ip.to_string()
}

async fn start(config: ServerConfig) -> (SocketAddr, oneshot::Sender<()>, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes = Router::new()
        .merge(common_routes())
        .route("/whoami", get(whoami));
    let router = middleware::apply(routes, &config);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let shutdown = async move {
            let _ = stop_rx.await;
        };
        server::serve(listener, router, &config, shutdown).await.unwrap();
    });
    (addr, stop_tx, handle)
}

/// Reads until the server closes the connection.
async fn read_until_closed(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut buf))
        .await
        .expect("server kept the connection open");
    // A reset is as good as a clean close here.
    let _ = read;
    String::from_utf8_lossy(&buf).into_owned()
}

#[tokio::test]
async fn serves_requests_with_peer_address() {
    let (addr, _stop, _handle) = start(ServerConfig::default()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /whoami HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let response = read_until_closed(&mut stream).await;
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.ends_with("127.0.0.1"), "{}", response);
}

#[tokio::test]
async fn slow_headers_are_cut_off() {
    let mut config = ServerConfig::default();
    config.read_timeout = Duration::from_millis(200);
    let (addr, _stop, _handle) = start(config).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\n")
        .await
        .unwrap();

    let response = read_until_closed(&mut stream).await;
    assert!(!response.contains("All good."), "{}", response);
}

#[tokio::test]
async fn idle_keep_alive_connection_is_closed() {
    let mut config = ServerConfig::default();
    config.idle_timeout = Duration::from_millis(200);
    let (addr, _stop, _handle) = start(config).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(REQUEST).await.unwrap();

    let response = read_until_closed(&mut stream).await;
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.contains("All good."), "{}", response);
}

#[tokio::test]
async fn shutdown_drains_open_connections() {
    let (addr, stop, handle) = start(ServerConfig::default()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(REQUEST).await.unwrap();
    let mut first = [0u8; 12];
    stream.read_exact(&mut first).await.unwrap();
    assert_eq!(&first, b"HTTP/1.1 200");

    stop.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("serve did not return after shutdown")
        .unwrap();
    read_until_closed(&mut stream).await;
    assert!(TcpStream::connect(addr).await.is_err());
}

//! Shared helpers for tests that need a local HTTP server.

use axum::Router;
use reqwest::Client;
use std::net::SocketAddr;

/// Serve `router` on an ephemeral localhost port for the rest of the test.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// HTTP client that ignores proxy environment variables.
pub fn local_client() -> Client {
    Client::builder().no_proxy().build().unwrap()
}

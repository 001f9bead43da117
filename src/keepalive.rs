//! A tiny HTTP server for hosts that put idle processes to sleep.
//!
//! Uptime pingers hit it periodically, every path answers with [ONLINE_MESSAGE].

use std::net::Ipv4Addr;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

use crate::JukeboxError;

/// Body of every keep-alive response.
pub const ONLINE_MESSAGE: &str = "Music bot online!";

/// The keep-alive routes.
pub fn router() -> Router {
    Router::new().fallback(|| async { ONLINE_MESSAGE })
}

/// Listen on every interface at `port`.
pub async fn bind(port: u16) -> Result<TcpListener, JukeboxError> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Keep-alive server listening on {addr}");
    Ok(listener)
}

/// Answer requests until the listener fails.
pub async fn serve(listener: TcpListener) -> Result<(), JukeboxError> {
    axum::serve(listener, router()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn spawn_server() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind a free port");
        let addr = listener.local_addr().expect("bound address");
        tokio::spawn(serve(listener));
        addr
    }

    #[tokio::test]
    async fn root_answers_online() {
        let addr = spawn_server().await;
        let response = reqwest::get(format!("http://{addr}/"))
            .await
            .expect("request succeeds");

        assert!(response.status().is_success());
        assert_eq!(response.text().await.expect("body"), ONLINE_MESSAGE);
    }

    #[tokio::test]
    async fn any_path_answers_online() {
        let addr = spawn_server().await;
        let body = reqwest::get(format!("http://{addr}/health/check"))
            .await
            .expect("request succeeds")
            .text()
            .await
            .expect("body");

        assert_eq!(body, ONLINE_MESSAGE);
    }
}

//! Endpoint server for exposing metrics and health checks

use anyhow::Result;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::metrics::metrics;

/// Start the endpoint server on `port`
pub async fn endpoint_server(port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Metrics endpoint listening on {}", addr);
    serve(listener).await
}

/// Serve `/metrics` and `/health` on an already bound listener
pub async fn serve(listener: TcpListener) -> Result<()> {
    loop {
        match listener.accept().await {
            Ok((mut socket, peer)) => {
                tokio::spawn(async move {
                    let mut buf = [0; 1024];
                    match socket.read(&mut buf).await {
                        Ok(n) => {
                            let request = String::from_utf8_lossy(&buf[..n]);
                            let response = respond(request_path(&request));
                            if let Err(e) = socket.write_all(response.as_bytes()).await {
                                tracing::debug!("Failed to write response to {}: {}", peer, e);
                            }
                        }
                        Err(e) => {
                            tracing::error!("Failed to read from socket: {}", e);
                        }
                    }
                });
            }
            Err(e) => {
                tracing::error!("Failed to accept connection: {}", e);
            }
        }
    }
}

fn request_path(request: &str) -> Option<&str> {
    let mut parts = request.lines().next()?.split_whitespace();
    match parts.next()? {
        "GET" => parts.next(),
        _ => None,
    }
}

fn respond(path: Option<&str>) -> String {
    let (status, content_type, body) = match path {
        Some("/metrics") => match metrics().render() {
            Ok(text) => ("200 OK", "text/plain; version=0.0.4", text),
            Err(e) => (
                "500 Internal Server Error",
                "text/plain",
                format!("metrics encoding failed: {}", e),
            ),
        },
        Some("/health") => ("200 OK", "text/plain", "ok".to_string()),
        _ => ("404 Not Found", "text/plain", "not found".to_string()),
    };
    format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    )
}

//! Shared fixtures for integration testing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use endpoint_gateway::config::{GatewayConfig, RouteDefinition};
use endpoint_gateway::discovery::{ServiceInstance, WEB_MAPPINGS_METADATA_NAME};
use url::Url;

/// Start a mock backend that echoes the request path and the value of the
/// `x-web-endpoint-id` header back in the response body as
/// `path=<path>;endpoint=<id or none>`.
#[allow(dead_code)]
pub async fn start_echo_backend(addr: SocketAddr) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        let mut head = Vec::new();
                        loop {
                            match socket.read(&mut buf).await {
                                Ok(0) => break,
                                Ok(n) => {
                                    head.extend_from_slice(&buf[..n]);
                                    if head.windows(4).any(|w| w == b"\r\n\r\n") {
                                        break;
                                    }
                                }
                                Err(_) => return,
                            }
                        }
                        let head = String::from_utf8_lossy(&head);
                        let path = head
                            .lines()
                            .next()
                            .and_then(|line| line.split_whitespace().nth(1))
                            .unwrap_or("")
                            .to_string();
                        let endpoint = head
                            .lines()
                            .find_map(|line| {
                                let (name, value) = line.split_once(':')?;
                                name.trim()
                                    .eq_ignore_ascii_case("x-web-endpoint-id")
                                    .then(|| value.trim().to_string())
                            })
                            .unwrap_or_else(|| "none".to_string());

                        let body = format!("path={};endpoint={}", path, endpoint);
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// An instance advertising the given endpoint-mapping JSON.
#[allow(dead_code)]
pub fn instance(service: &str, host: &str, port: u16, mappings: &str) -> ServiceInstance {
    let mut metadata = HashMap::new();
    metadata.insert(WEB_MAPPINGS_METADATA_NAME.to_string(), mappings.to_string());
    ServiceInstance {
        service_id: service.to_string(),
        host: host.to_string(),
        port,
        secure: false,
        metadata,
    }
}

/// A config with one endpoint-mapped wildcard route.
#[allow(dead_code)]
pub fn config_with_wildcard_route(route_id: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config
        .routes
        .push(RouteDefinition::new(route_id, Url::parse("we://all").unwrap()));
    config
}

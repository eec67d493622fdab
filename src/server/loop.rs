// Server loop module
// Accepts connections until shutdown is signalled

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::time::Instant;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Accept connections on `listener` until `shutdown` is notified, then wait
/// for in-flight connections to finish.
///
/// The wait is bounded by `max(read_timeout, write_timeout)`, the same limit
/// each connection task already runs under.
pub async fn run_server(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: Arc<Notify>,
) -> std::io::Result<()> {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = shutdown.notified() => break,
        }
    }

    drop(listener);
    logger::log_shutdown(active_connections.load(Ordering::SeqCst));

    let performance = &state.config.performance;
    let grace = Duration::from_secs(performance.read_timeout.max(performance.write_timeout));
    drain_connections(&active_connections, grace).await;
    Ok(())
}

/// Poll the active connection count until it reaches zero or `grace` elapses
async fn drain_connections(active_connections: &AtomicUsize, grace: Duration) {
    let deadline = Instant::now() + grace;
    loop {
        let remaining = active_connections.load(Ordering::SeqCst);
        if remaining == 0 {
            logger::log_drained();
            return;
        }
        if Instant::now() >= deadline {
            logger::log_warning(&format!(
                "Shutdown grace period of {}s elapsed with {remaining} connections still active",
                grace.as_secs()
            ));
            return;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::server::create_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn roundtrip(addr: std::net::SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_serves_over_tcp_until_shutdown() {
        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(AppState::new(&test_config()));
        let shutdown = Arc::new(Notify::new());
        let server = tokio::spawn(run_server(listener, state, Arc::clone(&shutdown)));

        let response = roundtrip(
            addr,
            "GET /cars?id=3 HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("content-type: application/json"));
        assert!(response.contains(r#""model":"Impreza""#));

        let body = r#"{"id":"9","manufacturer":"Mazda","model":"MX-5","year":1995,"power":131,"color":"Red"}"#;
        let response = roundtrip(
            addr,
            &format!(
                "POST /cars HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            ),
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with("The item was added"));

        shutdown.notify_one();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_in_flight_request() {
        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(AppState::new(&test_config()));
        let shutdown = Arc::new(Notify::new());
        let server = tokio::spawn(run_server(listener, Arc::clone(&state), Arc::clone(&shutdown)));

        let body = r#"{"id":"10","manufacturer":"Honda","model":"S2000","year":2004,"power":237,"color":"Yellow"}"#;
        let (first, rest) = body.split_at(12);
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(
                format!(
                    "POST /cars HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{first}",
                    body.len()
                )
                .as_bytes(),
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        shutdown.notify_one();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!server.is_finished());

        stream.write_all(rest.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with("The item was added"));

        server.await.unwrap().unwrap();
        assert_eq!(state.cars.store().get("10").unwrap().model, "S2000");
    }

    #[tokio::test]
    async fn test_drain_gives_up_after_grace() {
        let active = AtomicUsize::new(1);
        let started = Instant::now();
        drain_connections(&active, Duration::from_millis(50)).await;
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(active.load(Ordering::SeqCst), 1);
    }
}

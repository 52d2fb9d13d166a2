//! Shared test fixtures

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;

/// In-process webhook receiver counting POSTs
pub struct Receiver {
    pub url: String,
    pub hits: Arc<AtomicUsize>,
}

/// Start a receiver on an ephemeral port answering every POST with `status`
pub async fn spawn_receiver(status: u16) -> Receiver {
    spawn_slow_receiver(status, Duration::ZERO).await
}

/// Like [`spawn_receiver`], holding each response for `delay`
pub async fn spawn_slow_receiver(status: u16, delay: Duration) -> Receiver {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let status = StatusCode::from_u16(status).unwrap();

    let app = Router::new().route(
        "/hook",
        post(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                status
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Receiver {
        url: format!("http://{}/hook", addr),
        hits,
    }
}

/// Write alert lines to a file, one JSON object per line
pub fn write_alerts(path: &std::path::Path, lines: &[&str]) {
    let mut contents = lines.join("\n");
    contents.push('\n');
    std::fs::write(path, contents).unwrap();
}

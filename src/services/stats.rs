// SPDX-License-Identifier: MIT

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

/// Cumulative pipeline counters for the lifetime of the process.
#[derive(Default)]
pub struct RunStats {
    pub runs_started: AtomicU64,
    pub runs_failed: AtomicU64,
    pub shipments_listed: AtomicU64,
    pub shipments_valid: AtomicU64,
    pub shipments_succeeded: AtomicU64,
    pub shipments_failed: AtomicU64,
}

pub async fn spawn_metrics_server(port: u16, stats: Arc<RunStats>) -> Option<SocketAddr> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::warn!("Metrics server failed to bind: {}", e);
            return None;
        }
    };

    let local = listener.local_addr().ok();
    if let Some(addr) = local {
        tracing::info!("Metrics server listening on {}", addr);
    }

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let body = render_metrics(&stats);
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                }
                Err(e) => {
                    tracing::warn!("Metrics accept error: {}", e);
                    continue;
                }
            }
        }
    });

    local
}

fn render_metrics(stats: &Arc<RunStats>) -> String {
    format!(
        concat!(
            "# TYPE reconcile_runs_started counter\nreconcile_runs_started {}\n",
            "# TYPE reconcile_runs_failed counter\nreconcile_runs_failed {}\n",
            "# TYPE reconcile_shipments_listed counter\nreconcile_shipments_listed {}\n",
            "# TYPE reconcile_shipments_valid counter\nreconcile_shipments_valid {}\n",
            "# TYPE reconcile_shipments_succeeded counter\nreconcile_shipments_succeeded {}\n",
            "# TYPE reconcile_shipments_failed counter\nreconcile_shipments_failed {}\n"
        ),
        stats.runs_started.load(Ordering::Relaxed),
        stats.runs_failed.load(Ordering::Relaxed),
        stats.shipments_listed.load(Ordering::Relaxed),
        stats.shipments_valid.load(Ordering::Relaxed),
        stats.shipments_succeeded.load(Ordering::Relaxed),
        stats.shipments_failed.load(Ordering::Relaxed),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn metrics_endpoint_serves() {
        let stats = Arc::new(RunStats::default());
        stats.runs_started.fetch_add(3, Ordering::Relaxed);

        let addr = spawn_metrics_server(0, stats.clone())
            .await
            .expect("bind metrics");

        let body = reqwest::get(format!("http://{}", addr))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        assert!(body.contains("reconcile_runs_started 3"));
    }
}

// src/ground_truth.rs
//
// Latest-value ground-truth steering angle.
//
// One writer (the UDP subscription task) and one reader (the frame loop)
// share a single f32 behind a single Mutex. Neither side holds the lock
// across anything else, so there is nothing to deadlock on.

use anyhow::{Context, Result};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

const MAX_DATAGRAM: usize = 1024;

#[derive(Debug, Clone, Default)]
pub struct GroundTruthCell {
    inner: Arc<Mutex<f32>>,
}

impl GroundTruthCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites whatever was there; history is never kept.
    pub fn publish(&self, angle: f32) {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = angle;
    }

    pub fn latest(&self) -> f32 {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Parses `angle` or `...;angle`: the last `;`-separated field wins.
pub fn parse_datagram(payload: &[u8]) -> Option<f32> {
    let text = std::str::from_utf8(payload).ok()?;
    let field = text.trim().rsplit(';').next()?.trim();
    let angle: f32 = field.parse().ok()?;
    angle.is_finite().then_some(angle)
}

pub async fn bind_listener(addr: &str) -> Result<UdpSocket> {
    let socket = UdpSocket::bind(addr)
        .await
        .with_context(|| format!("binding ground-truth listener on {}", addr))?;
    info!("📡 Ground truth listening on {}", socket.local_addr()?);
    Ok(socket)
}

/// Runs until the socket errors out. Bad payloads are logged and dropped.
pub async fn run_listener(socket: UdpSocket, cell: GroundTruthCell) {
    let mut buf = [0u8; MAX_DATAGRAM];
    loop {
        let (len, peer) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                warn!("Ground-truth socket closed: {}", e);
                return;
            }
        };

        match parse_datagram(&buf[..len]) {
            Some(angle) => {
                cell.publish(angle);
                debug!("ground truth {:.4} from {}", angle, peer);
            }
            None => warn!(
                "⚠️  Dropping unparseable ground-truth datagram from {} ({} bytes)",
                peer, len
            ),
        }
    }
}

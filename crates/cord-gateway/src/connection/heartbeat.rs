//! Heartbeating
//!
//! A beat is due every `heartbeat_interval` ms. A beat that finds the
//! previous one unanswered closes the connection so it can be resumed.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::Rng;
use tokio::sync::mpsc;

use super::Outgoing;
use crate::protocol::CloseCode;

/// Frames per minute left for everything but heartbeats
pub fn frame_budget(interval: Duration) -> NonZeroU32 {
    let interval_ms = interval.as_millis().max(1);
    let beats = u32::try_from(60_000 / interval_ms).unwrap_or(u32::MAX);
    NonZeroU32::new(119u32.saturating_sub(beats)).unwrap_or(NonZeroU32::MIN)
}

/// Acknowledgement tracking for one connection
#[derive(Debug)]
pub struct HeartbeatState {
    acked: AtomicBool,
    sent_at: Mutex<Option<Instant>>,
    latency: Mutex<Option<Duration>>,
}

impl Default for HeartbeatState {
    fn default() -> Self {
        Self {
            acked: AtomicBool::new(true),
            sent_at: Mutex::new(None),
            latency: Mutex::new(None),
        }
    }
}

impl HeartbeatState {
    /// Mark a beat as sent; false if the previous one was never acked
    fn beat(&self) -> bool {
        let acked = self.acked.swap(false, Ordering::AcqRel);
        *self.sent_at.lock() = Some(Instant::now());
        acked
    }

    /// Record a HEARTBEAT_ACK and return the measured latency
    pub fn ack(&self) -> Option<Duration> {
        self.acked.store(true, Ordering::Release);
        let latency = self.sent_at.lock().map(|sent| sent.elapsed());
        if latency.is_some() {
            *self.latency.lock() = latency;
        }
        latency
    }

    pub fn latency(&self) -> Option<Duration> {
        *self.latency.lock()
    }

    /// Start over for a new connection, keeping the last latency
    pub fn reset(&self) {
        self.acked.store(true, Ordering::Release);
        *self.sent_at.lock() = None;
    }
}

/// Beat until the writer goes away or an ack is missing
pub async fn run(
    interval: Duration,
    state: std::sync::Arc<HeartbeatState>,
    outgoing: mpsc::UnboundedSender<Outgoing>,
) {
    let jitter: f64 = rand::thread_rng().gen_range(0.0..1.0);
    tokio::time::sleep(interval.mul_f64(jitter)).await;

    loop {
        if !state.beat() {
            tracing::warn!("Heartbeat was not acknowledged, reconnecting");
            let _ = outgoing.send(Outgoing::Close(CloseCode::HeartbeatNotProperlyAnswered));
            return;
        }
        if outgoing.send(Outgoing::Heartbeat).is_err() {
            return;
        }
        tracing::trace!("Heartbeat sent");
        tokio::time::sleep(interval).await;
    }
}

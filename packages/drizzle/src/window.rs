//! Collecting everything a channel yields within a time window.

use crate::Channel;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};


/// Take values from `input` until `window` elapses or `input` is closed and drained
///
/// Values are returned in arrival order. Returns no later than `window` after being called (up to
/// timer granularity), even if nothing arrives. Does not close `input`.
pub async fn collect_for<T>(input: &Channel<T>, window: Duration) -> Vec<T> {
    let mut collected = Vec::new();
    let Some(deadline) = Instant::now().checked_add(window) else {
        // a deadline past the end of time never arrives
        while let Some(msg) = input.take().await {
            collected.push(msg);
        }
        return collected;
    };
    while Instant::now() < deadline {
        match timeout_at(deadline, input.take()).await {
            Ok(Some(msg)) => collected.push(msg),
            // closed and drained
            Ok(None) => break,
            // deadline
            Err(_) => break,
        }
    }
    collected
}

//! Timer-driven producer.

use crate::Channel;
use std::time::Duration;
use tokio::time::sleep;


/// Create a channel which receives `msg` after every delay chosen by `delay`
///
/// Spawns [`run_timer`] onto the current tokio runtime, so this must be called from within one.
/// Closing the returned channel stops the timer at its next firing.
pub fn timer_channel<T, F>(delay: F, msg: T) -> Channel<T>
where
    T: Clone + Send + 'static,
    F: FnMut() -> Duration + Send + 'static,
{
    let out = Channel::unbounded();
    tokio::spawn(run_timer(out.clone(), delay, msg));
    out
}

/// Repeatedly wait for a delay and then put a clone of `msg` into `out`
///
/// `delay` is called again before every wait, including the first, so successive intervals may
/// differ. Returns once a put finds `out` closed. A put rejected because `out` is full does not
/// stop the timer.
pub async fn run_timer<T, F>(out: Channel<T>, mut delay: F, msg: T)
where
    T: Clone,
    F: FnMut() -> Duration,
{
    loop {
        sleep(delay()).await;
        if let Err(e) = out.put(msg.clone()) {
            if e.is_closed() {
                trace!("timer channel closed, stopping timer");
                return;
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::Overflow;
    use tokio::time::{Instant, timeout};

    #[tokio::test(start_paused = true)]
    async fn first_emission_waits_for_first_delay() {
        let start = Instant::now();
        let ticks = timer_channel(|| Duration::from_millis(100), ());
        assert_eq!(ticks.take().await, Some(()));
        assert!(start.elapsed() >= Duration::from_millis(100));
        ticks.close();
    }

    #[tokio::test(start_paused = true)]
    async fn delay_is_reevaluated_every_firing() {
        let mut delays = vec![30u64, 10, 50, 20].into_iter();
        let start = Instant::now();
        let ticks = timer_channel(
            move || Duration::from_millis(delays.next().unwrap_or(1_000)),
            "tick",
        );

        let mut prev = start;
        for expected in [30u64, 10, 50, 20] {
            assert_eq!(ticks.take().await, Some("tick"));
            let gap = prev.elapsed();
            assert!(gap >= Duration::from_millis(expected), "{:?} < {}ms", gap, expected);
            assert!(gap < Duration::from_millis(expected + 5), "{:?} >> {}ms", gap, expected);
            prev = Instant::now();
        }
        ticks.close();
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_closed() {
        let out = Channel::unbounded();
        let timer = tokio::spawn(run_timer(out.clone(), || Duration::from_millis(10), 1u8));
        assert_eq!(out.take().await, Some(1));
        out.close();
        timeout(Duration::from_millis(100), timer).await
            .expect("timer did not stop after close")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_running_when_full_and_rejecting() {
        let out = Channel::with_overflow(1, Overflow::Reject);
        let timer = tokio::spawn(run_timer(out.clone(), || Duration::from_millis(10), 1u8));
        tokio::time::sleep(Duration::from_millis(55)).await;
        assert_eq!(out.len(), 1);
        assert!(!timer.is_finished());
        out.close();
        timer.await.unwrap();
    }
}

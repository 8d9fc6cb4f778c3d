//! Batching a channel into fixed time windows.

use crate::{
    Channel,
    window::collect_for,
};
use std::time::Duration;


/// Create a channel which receives one batch of `input`'s values per `window`
///
/// Spawns [`run_chunker`] onto the current tokio runtime, so this must be called from within one.
pub fn chunked_channel<T>(input: Channel<T>, window: Duration) -> Channel<Vec<T>>
where
    T: Send + 'static,
{
    let out = Channel::unbounded();
    tokio::spawn(run_chunker(input, out.clone(), window));
    out
}

/// Repeatedly collect `input` for `window` and put each non-empty batch into `output`
///
/// Empty windows produce nothing, and a batch that a full `output` rejects is dropped. Returns
/// once `output` is closed, or once `input` is closed and every value buffered in it has been
/// batched. In the latter case `output` is closed too, so that its consumers see the end of the
/// stream.
///
/// Batches are aligned to this loop's own cadence, not to any clock, so they drift slightly
/// against real time while each still spans about `window`.
pub async fn run_chunker<T>(input: Channel<T>, output: Channel<Vec<T>>, window: Duration) {
    while !output.is_closed() && !input.is_drained() {
        let chunk = collect_for(&input, window).await;
        if chunk.is_empty() {
            continue;
        }
        trace!(len = chunk.len(), "emitting chunk");
        if let Err(e) = output.put(chunk) {
            if e.is_closed() {
                break;
            }
            trace!("chunk output full, dropped chunk");
        }
    }

    if input.is_closed() {
        debug!("chunker input closed, closing output");
        output.close();
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::Overflow;
    use tokio::time::{Instant, sleep, timeout};

    const WINDOW: Duration = Duration::from_millis(40);

    #[tokio::test(start_paused = true)]
    async fn three_values_then_close_emit_one_batch() {
        let input = Channel::unbounded();
        let output = Channel::unbounded();
        let chunker = tokio::spawn(run_chunker(input.clone(), output.clone(), WINDOW));

        sleep(Duration::from_millis(5)).await;
        input.put(1).unwrap();
        input.put(2).unwrap();
        input.put(3).unwrap();
        input.close();

        assert_eq!(output.take().await, Some(vec![1, 2, 3]));
        assert_eq!(output.take().await, None);
        chunker.await.unwrap();
        assert!(output.is_drained());
    }

    #[tokio::test(start_paused = true)]
    async fn values_buffered_before_close_are_still_batched() {
        let input = Channel::unbounded();
        let output = Channel::unbounded();
        input.put('a').unwrap();
        input.put('b').unwrap();
        input.close();

        run_chunker(input, output.clone(), WINDOW).await;
        assert_eq!(output.try_take(), Some(vec!['a', 'b']));
        assert!(output.is_drained());
    }

    #[tokio::test(start_paused = true)]
    async fn batches_follow_windows() {
        let input = Channel::unbounded();
        let output = chunked_channel(input.clone(), WINDOW);
        let start = Instant::now();

        // two values in the first window, nothing in the second, one in the third
        input.put(1).unwrap();
        sleep(Duration::from_millis(10)).await;
        input.put(2).unwrap();
        sleep(Duration::from_millis(80)).await;
        input.put(3).unwrap();

        assert_eq!(output.take().await, Some(vec![1, 2]));
        assert_eq!(output.take().await, Some(vec![3]));
        assert!(start.elapsed() >= Duration::from_millis(80));
        input.close();
        assert_eq!(output.take().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_output_closed() {
        let input = Channel::<u32>::unbounded();
        let output = Channel::unbounded();
        let chunker = tokio::spawn(run_chunker(input.clone(), output.clone(), WINDOW));

        output.close();
        timeout(WINDOW * 3, chunker).await
            .expect("chunker did not stop after output closed")
            .unwrap();

        // a closed output never closes the input
        assert!(!input.is_closed());
        input.put(1).unwrap();
        assert_eq!(output.try_take(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn batch_rejected_by_full_output_is_dropped() {
        let input = Channel::unbounded();
        let output = Channel::with_overflow(1, Overflow::Reject);
        let chunker = tokio::spawn(run_chunker(input.clone(), output.clone(), WINDOW));

        sleep(Duration::from_millis(5)).await;
        input.put(1).unwrap();
        sleep(Duration::from_millis(45)).await;
        assert_eq!(output.len(), 1);
        input.put(2).unwrap();
        sleep(Duration::from_millis(40)).await;
        input.close();

        chunker.await.unwrap();
        assert_eq!(output.take().await, Some(vec![1]));
        assert_eq!(output.take().await, None);
    }
}

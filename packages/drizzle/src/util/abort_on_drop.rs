use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::task::{
    spawn,
    JoinError,
    JoinHandle,
};


/// Wrapper around tokio task that aborts if dropped.
///
/// Awaiting it awaits the task's output.
pub struct AbortOnDrop<T>(JoinHandle<T>);

impl<T: Send + 'static> AbortOnDrop<T> {
    /// Spawn a tokio task and wrap with self.
    pub fn spawn<F>(f: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        AbortOnDrop(spawn(f))
    }
}

impl<T> AbortOnDrop<T> {
    /// Abort the task now.
    pub fn abort(&self) {
        self.0.abort();
    }

    /// Whether the task has finished, either by completing, panicking, or being aborted.
    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl<T> Future for AbortOnDrop<T> {
    type Output = Result<T, JoinError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().0).poll(cx)
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

// exposed API of channels

use self::future::*;
use super::{
    error::*,
    core,
};
use std::fmt::{self, Formatter, Debug};

pub use super::core::Overflow;


// ==== the exposed API ====


/// Closable, optionally bounded FIFO channel with asynchronous take
///
/// Handles are cheap to clone and all clones share the same channel. Any handle may put, take, or
/// close. There is no sender/receiver split: producers and consumers share the channel for its
/// whole lifetime, and whichever side decides the flow is over closes it.
///
/// - [`put`](Self::put) never waits. If a take is pending, the message is handed directly to the
///   longest-waiting take. Otherwise it is buffered. If the buffer is at its bound, the
///   [`Overflow`] policy decides between evicting the oldest buffered message and rejecting the
///   new one.
/// - [`take`](Self::take) returns a future that resolves to the oldest buffered message, or waits
///   for one. Takes are served in the order `take` was called.
/// - [`close`](Self::close) is permanent. Messages already buffered can still be taken, after
///   which every take resolves to `None`.
pub struct Channel<T>(core::Channel<T>);

impl<T> Channel<T> {
    /// Create an unbounded channel
    ///
    /// Puts into an unbounded channel only fail once it is closed.
    pub fn unbounded() -> Self {
        Channel(core::Channel::new(None, Overflow::DropOldest))
    }

    /// Create a bounded channel that evicts its oldest message when full
    ///
    /// This makes the buffer a sliding window over the most recent `bound` messages. Panics if
    /// `bound` is zero.
    pub fn bounded(bound: usize) -> Self {
        Self::with_overflow(bound, Overflow::DropOldest)
    }

    /// Create a bounded channel with the given overflow policy
    ///
    /// Panics if `bound` is zero.
    pub fn with_overflow(bound: usize, overflow: Overflow) -> Self {
        Channel(core::Channel::new(Some(bound), overflow))
    }

    /// Put a message into the channel without waiting
    ///
    /// On success, returns the message that was evicted to make room, if any. Fails if the
    /// channel is closed, or if it is full and its overflow policy is [`Overflow::Reject`]. The
    /// error carries the message back.
    pub fn put(&self, msg: T) -> Result<Option<T>, PutError<T>> {
        // fast path that avoids locking
        if self.0.is_closed() {
            return Err(PutError { msg, cause: ClosedError.into() });
        }
        match self.0.lock().put(msg) {
            core::Put::Delivered => {
                trace!("message delivered directly to waiting take");
                Ok(None)
            }
            core::Put::Buffered => Ok(None),
            core::Put::Evicted(evicted) => {
                trace!("channel full, evicted oldest buffered message");
                Ok(Some(evicted))
            }
            core::Put::Closed(msg) => Err(PutError { msg, cause: ClosedError.into() }),
            core::Put::Full(msg) => Err(PutError { msg, cause: FullError.into() }),
        }
    }

    /// Create a future to take a message from the channel
    ///
    /// The take is registered when this method is called, not when the future is first polled,
    /// so takes are served in the order this method was called. The future resolves to `None`
    /// once the channel is closed and no buffered messages remain.
    ///
    /// Dropping the future before it resolves withdraws the take. If a message had already been
    /// handed to it, the message is returned to the front of the channel.
    pub fn take(&self) -> TakeFut<T> {
        match self.0.lock().take() {
            core::Take::Ready(msg) => TakeFut::ready(Some(msg)),
            core::Take::Closed => TakeFut::ready(None),
            core::Take::Wait(id, rx) => TakeFut::waiting(self.0.clone(), id, rx),
        }
    }

    /// Take a buffered message if one is immediately available
    ///
    /// Returns `None` both when the channel is empty and when it is drained. Use
    /// [`is_closed`](Self::is_closed) to tell them apart.
    pub fn try_take(&self) -> Option<T> {
        self.0.lock().try_take()
    }

    /// Close the channel
    ///
    /// All pending takes resolve to `None`, all further puts fail, and buffered messages remain
    /// available to take. Closing an already closed channel does nothing.
    pub fn close(&self) {
        if self.0.is_closed() {
            return;
        }
        if let Some(woken) = self.0.lock().close() {
            trace!(woken, "channel closed");
        }
    }

    /// Whether the channel has been closed
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }

    /// Whether the channel has been closed and all its buffered messages taken
    pub fn is_drained(&self) -> bool {
        self.0.is_closed() && self.0.lock().is_drained()
    }

    /// Number of currently buffered messages
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    /// Whether no messages are currently buffered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of buffered messages, or `None` if unbounded
    pub fn bound(&self) -> Option<usize> {
        self.0.lock().bound()
    }

    /// What a put does when the channel is full
    pub fn overflow(&self) -> Overflow {
        self.0.lock().overflow()
    }
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Channel(self.0.clone())
    }
}

impl<T> Debug for Channel<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let lock = self.0.lock();
        f.debug_struct("Channel")
            .field("len", &lock.len())
            .field("bound", &lock.bound())
            .field("overflow", &lock.overflow())
            .field("closed", &self.0.is_closed())
            .finish()
    }
}


// future types for channels.
pub(crate) mod future {
    use super::*;
    use std::{
        future::Future,
        mem::replace,
        pin::Pin,
        task::{Context, Poll},
    };
    use tokio::sync::oneshot;

    /// Future for taking a message from a [`Channel`]
    ///
    /// Resolves to `None` once the channel is closed and drained. Once resolved, polling again
    /// returns `Poll::Pending` forever.
    pub struct TakeFut<T>(TakeState<T>);

    enum TakeState<T> {
        // resolved at creation, not yet polled.
        Ready(Option<T>),
        // registered as a waiter in the channel.
        Waiting {
            channel: core::Channel<T>,
            id: u64,
            rx: oneshot::Receiver<T>,
        },
        // already resolved.
        Terminated,
    }

    // T is only ever moved, never pinned.
    impl<T> Unpin for TakeFut<T> {}

    impl<T> TakeFut<T> {
        pub(super) fn ready(msg: Option<T>) -> Self {
            TakeFut(TakeState::Ready(msg))
        }

        pub(super) fn waiting(
            channel: core::Channel<T>,
            id: u64,
            rx: oneshot::Receiver<T>,
        ) -> Self {
            TakeFut(TakeState::Waiting { channel, id, rx })
        }

        /// Whether this future has already resolved
        pub fn is_terminated(&self) -> bool {
            matches!(self.0, TakeState::Terminated)
        }
    }

    impl<T> Future for TakeFut<T> {
        type Output = Option<T>;

        fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Option<T>> {
            let this = self.get_mut();
            match replace(&mut this.0, TakeState::Terminated) {
                TakeState::Ready(msg) => Poll::Ready(msg),
                TakeState::Waiting { channel, id, mut rx } => match Pin::new(&mut rx).poll(cx) {
                    // the sender is only dropped without sending when the channel closes
                    Poll::Ready(result) => Poll::Ready(result.ok()),
                    Poll::Pending => {
                        this.0 = TakeState::Waiting { channel, id, rx };
                        Poll::Pending
                    }
                },
                // for implementation of FusedFuture
                TakeState::Terminated => Poll::Pending,
            }
        }
    }

    #[cfg(feature = "futures")]
    impl<T> futures::future::FusedFuture for TakeFut<T> {
        fn is_terminated(&self) -> bool {
            Self::is_terminated(self)
        }
    }

    impl<T> Drop for TakeFut<T> {
        fn drop(&mut self) {
            if let TakeState::Waiting { channel, id, mut rx } =
                replace(&mut self.0, TakeState::Terminated)
            {
                channel.lock().abandon(id, &mut rx);
            }
        }
    }
}


// ==== tests ====

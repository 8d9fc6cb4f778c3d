// channel error types.

use std::fmt::{self, Formatter, Debug, Display};


// ==== base error types ====


/// Error for trying to put into a channel that has been closed
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, thiserror::Error)]
#[error("channel is closed")]
pub struct ClosedError;

/// Error for trying to put into a full channel whose overflow policy is
/// [`Reject`](crate::Overflow::Reject)
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, thiserror::Error)]
#[error("channel is full")]
pub struct FullError;


// ==== compound error types ====


/// Reason a message could not be put into a channel
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, thiserror::Error)]
pub enum PutErrorCause {
    /// The channel was closed
    #[error(transparent)]
    Closed(#[from] ClosedError),
    /// The channel was full and rejects messages when full
    #[error(transparent)]
    Full(#[from] FullError),
}

/// Error for trying to put into a channel
///
/// Carries the message back to the caller. A message that failed to be put has not been buffered
/// or delivered anywhere, so it should be treated as dropped unless the caller does something
/// with it.
#[derive(Clone, Eq, PartialEq)]
pub struct PutError<T> {
    /// The message that could not be put
    pub msg: T,
    /// The reason the message could not be put
    pub cause: PutErrorCause,
}

impl<T> PutError<T> {
    /// Whether this error is because the channel was closed
    ///
    /// A closed channel stays closed, so the caller should stop putting into it.
    pub fn is_closed(&self) -> bool {
        matches!(self.cause, PutErrorCause::Closed(_))
    }

    /// Whether this error is because the channel was full
    pub fn is_full(&self) -> bool {
        matches!(self.cause, PutErrorCause::Full(_))
    }

    /// Take back the message that could not be put
    pub fn into_inner(self) -> T {
        self.msg
    }
}

// manual impls so that T need not be Debug.

impl<T> Debug for PutError<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("PutError")
            .field("cause", &self.cause)
            .finish_non_exhaustive()
    }
}

impl<T> Display for PutError<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "failed to put message: {}", self.cause)
    }
}

impl<T> std::error::Error for PutError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

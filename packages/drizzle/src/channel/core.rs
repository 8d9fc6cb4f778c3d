// minimal API for the channel. the exposed API is a convenience wrapper around this.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{
            Ordering::Relaxed,
            AtomicBool,
            AtomicU64,
        },
        Arc,
        Mutex,
        MutexGuard,
    },
};
use tokio::sync::oneshot;


/// What a put does when a bounded channel is already full
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Overflow {
    /// Evict the single oldest buffered message to make room for the new one
    #[default]
    DropOldest,
    /// Refuse the new message and hand it back to the caller
    Reject,
}


// handle to a channel.
pub(crate) struct Channel<T>(Arc<Shared<T>>);

// channel shared state.
struct Shared<T> {
    // mutex around lockable state.
    lockable: Mutex<Lockable<T>>,

    // begins false. may eventually change to true, while the mutex is held, and then never
    // changes again.
    //
    // - if true, puts immediately fail.
    // - if true, takes immediately resolve to none once all elems are drained from
    //   Lockable.elems.
    // - if true, Lockable.waiters is empty.
    closed: AtomicBool,

    // source of unique waiter ids.
    next_waiter_id: AtomicU64,
}

// channel lockable state.
struct Lockable<T> {
    // storage for elements.
    elems: VecDeque<T>,
    // elems maximum length. never zero.
    bound: Option<usize>,
    // what to do when a put finds elems at the bound.
    overflow: Overflow,
    // pending takes, front is the longest-waiting.
    //
    // invariant: if waiters is non-empty then elems is empty, except transiently inside a method
    // of Lock.
    waiters: VecDeque<Waiter<T>>,
}

// a pending take.
struct Waiter<T> {
    id: u64,
    tx: oneshot::Sender<T>,
}

// outcome of putting an element.
pub(crate) enum Put<T> {
    // handed directly to a waiting take.
    Delivered,
    // appended to the buffer.
    Buffered,
    // appended to the buffer after evicting the oldest element, which is returned.
    Evicted(T),
    // the channel is closed. the element is returned.
    Closed(T),
    // the channel is full and the overflow policy is Reject. the element is returned.
    Full(T),
}

// outcome of starting a take.
pub(crate) enum Take<T> {
    // an element was buffered and has been removed.
    Ready(T),
    // the channel is closed and drained.
    Closed,
    // a waiter was registered. the element will arrive through the receiver, or the receiver
    // will error if the channel closes first.
    Wait(u64, oneshot::Receiver<T>),
}

impl<T> Channel<T> {
    // construct empty, open channel.
    //
    // panics if bound is Some(0).
    pub(crate) fn new(bound: Option<usize>, overflow: Overflow) -> Self {
        assert!(bound != Some(0), "channel bound must be greater than zero");
        Channel(Arc::new(Shared {
            lockable: Mutex::new(Lockable {
                elems: VecDeque::new(),
                bound,
                overflow,
                waiters: VecDeque::new(),
            }),
            closed: AtomicBool::new(false),
            next_waiter_id: AtomicU64::new(0),
        }))
    }

    // clone another handle to the channel.
    pub(crate) fn clone(&self) -> Self {
        Channel(Arc::clone(&self.0))
    }

    // atomic-read the closed flag.
    pub(crate) fn is_closed(&self) -> bool {
        self.0.closed.load(Relaxed)
    }

    // lock the channel
    pub(crate) fn lock(&self) -> Lock<'_, T> {
        Lock {
            shared: &self.0,
            lock: self.0.lockable.lock().unwrap(),
        }
    }
}

// lock on a channel.
pub(crate) struct Lock<'a, T> {
    shared: &'a Shared<T>,
    lock: MutexGuard<'a, Lockable<T>>,
}

impl<'a, T> Lock<'a, T> {
    // number of buffered elements.
    pub(crate) fn len(&self) -> usize {
        self.lock.elems.len()
    }

    // elems maximum length.
    pub(crate) fn bound(&self) -> Option<usize> {
        self.lock.bound
    }

    // overflow policy.
    pub(crate) fn overflow(&self) -> Overflow {
        self.lock.overflow
    }

    // whether the channel is closed and has no more elements to give.
    pub(crate) fn is_drained(&self) -> bool {
        self.shared.closed.load(Relaxed) && self.lock.elems.is_empty()
    }

    // put an element.
    pub(crate) fn put(&mut self, elem: T) -> Put<T> {
        if self.shared.closed.load(Relaxed) {
            return Put::Closed(elem);
        }

        // hand off to the longest-waiting take, if any
        let elem = match self.deliver(elem) {
            Ok(()) => return Put::Delivered,
            Err(elem) => elem,
        };

        if self.lock.bound.is_none_or(|n| self.lock.elems.len() < n) {
            self.lock.elems.push_back(elem);
            return Put::Buffered;
        }

        match self.lock.overflow {
            Overflow::Reject => Put::Full(elem),
            Overflow::DropOldest => {
                let evicted = self.lock.elems.pop_front();
                self.lock.elems.push_back(elem);
                match evicted {
                    Some(evicted) => Put::Evicted(evicted),
                    // unreachable, since bound is never zero
                    None => Put::Buffered,
                }
            }
        }
    }

    // start a take.
    pub(crate) fn take(&mut self) -> Take<T> {
        if let Some(elem) = self.lock.elems.pop_front() {
            return Take::Ready(elem);
        }
        if self.shared.closed.load(Relaxed) {
            return Take::Closed;
        }

        let id = self.shared.next_waiter_id.fetch_add(1, Relaxed);
        let (tx, rx) = oneshot::channel();
        self.lock.waiters.push_back(Waiter { id, tx });
        Take::Wait(id, rx)
    }

    // remove a buffered element without registering a waiter.
    pub(crate) fn try_take(&mut self) -> Option<T> {
        self.lock.elems.pop_front()
    }

    // close the channel, if not already closed. returns the number of pending takes that were
    // resolved to none, or None if the channel was already closed.
    pub(crate) fn close(&mut self) -> Option<usize> {
        if self.shared.closed.load(Relaxed) {
            return None;
        }
        self.shared.closed.store(true, Relaxed);

        // dropping the senders resolves every receiver
        let woken = self.lock.waiters.len();
        self.lock.waiters.clear();
        Some(woken)
    }

    // withdraw the waiter with the given id, which is dropping without having resolved.
    //
    // if an element was already delivered to it, the element is given back to the channel.
    pub(crate) fn abandon(&mut self, id: u64, rx: &mut oneshot::Receiver<T>) {
        if let Some(idx) = self.lock.waiters.iter().position(|waiter| waiter.id == id) {
            // still queued, so nothing can have been delivered
            self.lock.waiters.remove(idx);
            return;
        }

        // deliveries only happen while the lock is held, so whatever was delivered is visible now
        let Ok(elem) = rx.try_recv() else { return };
        trace!("take abandoned after delivery, returning element to channel");
        if let Err(elem) = self.deliver(elem) {
            // it was the oldest element in flight, so it goes back to the front
            self.lock.elems.push_front(elem);
            if self.lock.overflow == Overflow::DropOldest
                && self.lock.bound.is_some_and(|n| self.lock.elems.len() > n)
            {
                // it is also the oldest, so it is the one to evict
                trace!("channel full, evicting returned element");
                self.lock.elems.pop_front();
            }
        }
    }

    // hand the element to the longest-waiting take that is still listening, or give it back.
    fn deliver(&mut self, mut elem: T) -> Result<(), T> {
        while let Some(waiter) = self.lock.waiters.pop_front() {
            match waiter.tx.send(elem) {
                Ok(()) => return Ok(()),
                // receiver gone without withdrawing, skip it
                Err(returned) => elem = returned,
            }
        }
        Err(elem)
    }
}

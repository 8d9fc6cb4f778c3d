// implementation of the drizzle channel.
//
// the architecture is as such:
//
// channel handles wrap around Arc<shared state>
//                                  |
//          /-----------------------/
//          v
//       shared state
//          |
//          |------ a closed flag. it is only ever set while holding the mutex, and never unset.
//          |       reading it without the mutex is allowed as a cheap fast path.
//          |
//          \------ a mutex around lockable state, which contains:
//
//                  - a VecDeque<T> holding the buffered elements, with an optional bound and an
//                    overflow policy for what happens when a put hits the bound.
//                  - a "waiter queue": a FIFO of pending take operations. each waiter is the
//                    sending half of a tokio oneshot. a put with a non-empty waiter queue hands
//                    its element directly to the front waiter rather than buffering it, which is
//                    what gives takers FIFO fairness.
//
// closing the channel clears the waiter queue, which drops every oneshot sender, which resolves
// every pending take to "none".
//
// a take future that is dropped before resolving (for example, because it lost a race against a
// timer) withdraws its waiter. if an element was already handed to it but not yet observed, the
// element is given back to the channel, so abandoning a take never loses data.
//
// the organization of these modules is as such:
//
//      core: owns the lockable state. presents an abstraction for channels which is small and
//      ^     panicky about misuse, but never loses elements.
//      |
//      api: wrapper around core that adapts it into an API that is convenient and hard to
//           misuse. the crate re-exports this API publically.
//
// there is also the error module, which contains the relevant error types, which is also
// re-exported publically.

pub(crate) mod error;
pub(crate) mod api;

mod core;

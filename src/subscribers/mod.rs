//! # Subscribers: weak handles, handlers, publisher identity.
//!
//! A subscriber is any `Arc<S>` the caller owns. Registration stores a weak
//! [`SubscriberRef`] next to the handler; once the last strong reference is dropped
//! the entry is skipped and pruned by the next publish that scans its topic.
//!
//! Two ways to register:
//! - closures `Fn(Arc<S>, Sender, Arc<T>) -> impl Future<Output = Result<(), HandlerError>>`
//!   via [`Mediator::subscribe`](crate::Mediator::subscribe);
//! - types implementing [`Subscribe<T>`] via [`Mediator::attach`](crate::Mediator::attach).
//!
//! The handler receives the upgraded subscriber as its first argument, so it never
//! has to capture (and thereby pin) the subscriber itself.

pub(crate) mod entry;
mod sender;
mod subscribe;

pub use entry::{SubscriberEntry, SubscriberRef};
pub use sender::Sender;
pub use subscribe::Subscribe;

//! # Subscriber entries and weak ownership.
//!
//! A [`SubscriberEntry`] pairs a [`SubscriberRef`] (weak handle to the owning object) with a
//! type-erased handler. The mediator never keeps a subscriber alive: the only strong
//! reference it ever creates is the one passed to a handler for the duration of a call.
//!
//! ```text
//! subscribe(&Arc<S>, handler)
//!     └─► SubscriberEntry { Weak<S>, erased handler }
//!
//! publish scan:
//!     Weak::upgrade() ─┬─ Some(Arc<S>) ─► handler(Arc<S>, sender, Arc<T>)
//!                      └─ None         ─► pruned
//! ```

use std::any::Any;
use std::future::Future;
use std::sync::{Arc, Weak};

use futures::future::{self, BoxFuture};
use futures::FutureExt;

use crate::error::HandlerError;
use crate::subscribers::Sender;
use crate::topics::hierarchy::{unerase, ErasedValue};
use crate::topics::TopicType;

pub(crate) type AnySubscriber = Arc<dyn Any + Send + Sync>;
pub(crate) type HandlerFuture = BoxFuture<'static, Result<(), HandlerError>>;
pub(crate) type ErasedHandler =
    Arc<dyn Fn(AnySubscriber, Sender, ErasedValue) -> HandlerFuture + Send + Sync>;

/// Weak, liveness-checkable handle to a subscriber object.
#[derive(Clone)]
pub struct SubscriberRef {
    target: Weak<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl SubscriberRef {
    /// Downgrades `subscriber` without extending its lifetime.
    pub fn new<S: Send + Sync + 'static>(subscriber: &Arc<S>) -> Self {
        let strong: AnySubscriber = Arc::clone(subscriber) as AnySubscriber;
        Self {
            target: Arc::downgrade(&strong),
            type_name: std::any::type_name::<S>(),
        }
    }

    /// True while the subscriber is reachable elsewhere in the program.
    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }

    /// True if the subscriber is alive and is the same allocation as `subscriber`.
    pub fn points_to<S: ?Sized>(&self, subscriber: &Arc<S>) -> bool {
        self.is_alive()
            && std::ptr::eq(
                self.target.as_ptr() as *const (),
                Arc::as_ptr(subscriber) as *const (),
            )
    }

    /// Subscriber type name, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn upgrade(&self) -> Option<AnySubscriber> {
        self.target.upgrade()
    }
}

impl std::fmt::Debug for SubscriberRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRef")
            .field("type_name", &self.type_name)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// One registered handler of one subscriber on one topic.
#[derive(Clone)]
pub struct SubscriberEntry {
    pub(crate) id: u64,
    pub(crate) subscriber: SubscriberRef,
    pub(crate) handler: ErasedHandler,
    pub(crate) declared_type: TopicType,
}

impl SubscriberEntry {
    pub(crate) fn new(
        id: u64,
        subscriber: SubscriberRef,
        handler: ErasedHandler,
        declared_type: TopicType,
    ) -> Self {
        Self {
            id,
            subscriber,
            handler,
            declared_type,
        }
    }

    /// Weak subscriber handle.
    pub fn subscriber(&self) -> &SubscriberRef {
        &self.subscriber
    }

    /// Payload type the handler was registered for.
    pub fn declared_type(&self) -> TopicType {
        self.declared_type
    }
}

impl std::fmt::Debug for SubscriberEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberEntry")
            .field("id", &self.id)
            .field("subscriber", &self.subscriber)
            .field("declared_type", &self.declared_type)
            .finish()
    }
}

/// Erases a typed handler `Fn(Arc<S>, Sender, Arc<T>) -> Fut`.
pub(crate) fn erase_handler<S, T, F, Fut>(handler: F) -> ErasedHandler
where
    S: Send + Sync + 'static,
    T: ?Sized + Send + Sync + 'static,
    F: Fn(Arc<S>, Sender, Arc<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    Arc::new(
        move |subscriber: AnySubscriber, sender: Sender, value: ErasedValue| {
            let Ok(subscriber) = subscriber.downcast::<S>() else {
                return mismatch(std::any::type_name::<S>());
            };
            let Some(value) = unerase::<T>(&value) else {
                return mismatch(std::any::type_name::<T>());
            };
            handler(subscriber, sender, value).boxed()
        },
    )
}

fn mismatch(expected: &'static str) -> HandlerFuture {
    future::ready(Err(HandlerError::PayloadMismatch { expected })).boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics::hierarchy::erase;

    struct Widget;

    #[test]
    fn test_ref_does_not_keep_subscriber_alive() {
        let widget = Arc::new(Widget);
        let r = SubscriberRef::new(&widget);
        assert!(r.is_alive());
        assert!(r.points_to(&widget));
        assert_eq!(Arc::strong_count(&widget), 1);

        drop(widget);
        assert!(!r.is_alive());
        assert!(r.upgrade().is_none());
    }

    #[test]
    fn test_points_to_distinguishes_allocations() {
        let a = Arc::new(Widget);
        let b = Arc::new(7u64);
        let r = SubscriberRef::new(&a);
        assert!(!r.points_to(&b));
        assert!(r.type_name().ends_with("Widget"));
    }

    #[tokio::test]
    async fn test_erased_handler_round_trips_types() {
        let handler = erase_handler(|_w: Arc<Widget>, sender: Sender, v: Arc<u32>| async move {
            assert_eq!(sender.name(), "test");
            if *v == 1 {
                Ok(())
            } else {
                Err(HandlerError::fail("not one"))
            }
        });

        let widget: AnySubscriber = Arc::new(Widget);
        let ok = handler(Arc::clone(&widget), Sender::new("test"), erase(Arc::new(1u32))).await;
        assert!(ok.is_ok());

        let wrong = handler(widget, Sender::new("test"), erase(Arc::new("x"))).await;
        assert!(matches!(wrong, Err(HandlerError::PayloadMismatch { .. })));
    }
}

//! # Dispatch: invoke matched handlers, then await them together.
//!
//! Runs after the scan phase has released the registry lock.
//!
//! ```text
//! Scan.live ──► invoke() ──► [fut 1, fut 2, ..., fut N]      (handlers called, nothing awaited)
//!                                  │
//!                                  ▼
//!                           complete()  join_all / buffer_unordered(max_concurrent)
//!                                  │
//!                                  ├─ Ok            → delivered += 1
//!                                  └─ Err / panic   → failed += 1, warn!
//! ```
//!
//! ## Rules
//! - Handlers are called in scan order (records in traversal order, entries in registration order).
//! - Completion order is unspecified.
//! - A failing or panicking handler never affects the others or the publisher.

use std::panic::AssertUnwindSafe;

use futures::future::{self, FutureExt};
use futures::stream::{self, StreamExt};

use crate::error::HandlerError;
use crate::subscribers::entry::HandlerFuture;
use crate::subscribers::Sender;
use crate::topics::hierarchy::{ErasedValue, Lineage};
use crate::topics::registry::LiveTarget;
use crate::topics::TopicType;

/// Outcome of one publish call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Topic records that matched.
    pub topics: usize,
    /// Handlers that completed successfully.
    pub delivered: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
    /// Dead subscriber entries removed during the scan.
    pub pruned: usize,
}

impl PublishReport {
    /// Handlers invoked (delivered + failed).
    pub fn invoked(&self) -> usize {
        self.delivered + self.failed
    }
}

/// One called handler and the future it returned.
pub(crate) struct Invocation {
    topic: TopicType,
    subscriber: &'static str,
    future: HandlerFuture,
}

/// Calls every live handler with the value upcast to its topic's type.
pub(crate) fn invoke(
    targets: Vec<LiveTarget>,
    lineage: &Lineage,
    sender: &Sender,
    value: &ErasedValue,
    catch_panics: bool,
) -> Vec<Invocation> {
    let mut out = Vec::with_capacity(targets.len());

    for target in targets {
        let topic = target.record_type;
        let subscriber = target.entry.subscriber.type_name();

        let future = match lineage.upcast(topic, value) {
            Some(value) => call(target, sender.clone(), value, catch_panics),
            None => future::ready(Err(HandlerError::PayloadMismatch {
                expected: topic.name(),
            }))
            .boxed(),
        };

        out.push(Invocation {
            topic,
            subscriber,
            future,
        });
    }
    out
}

fn call(target: LiveTarget, sender: Sender, value: ErasedValue, catch_panics: bool) -> HandlerFuture {
    let handler = target.entry.handler;
    let subscriber = target.subscriber;

    if !catch_panics {
        return handler(subscriber, sender, value);
    }

    match std::panic::catch_unwind(AssertUnwindSafe(|| handler(subscriber, sender, value))) {
        Ok(fut) => AssertUnwindSafe(fut)
            .catch_unwind()
            .map(|res| match res {
                Ok(res) => res,
                Err(panic) => Err(HandlerError::Panicked {
                    info: panic_info(panic.as_ref()),
                }),
            })
            .boxed(),
        Err(panic) => future::ready(Err(HandlerError::Panicked {
            info: panic_info(panic.as_ref()),
        }))
        .boxed(),
    }
}

/// Awaits all invocations and tallies them into `report`.
pub(crate) async fn complete(
    invocations: Vec<Invocation>,
    limit: Option<usize>,
    report: &mut PublishReport,
) {
    let pending = invocations.into_iter().map(|inv| async move {
        let res = inv.future.await;
        (inv.topic, inv.subscriber, res)
    });

    let results: Vec<_> = match limit {
        None => future::join_all(pending).await,
        Some(n) => stream::iter(pending).buffer_unordered(n).collect().await,
    };

    for (topic, subscriber, res) in results {
        match res {
            Ok(()) => report.delivered += 1,
            Err(err) => {
                report.failed += 1;
                tracing::warn!(
                    topic = %topic,
                    subscriber,
                    label = err.as_label(),
                    error = %err,
                    "handler failed"
                );
            }
        }
    }
}

fn panic_info(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

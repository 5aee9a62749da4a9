//! # Mediator: typed topics, weak subscribers, concurrent dispatch.
//!
//! The [`Mediator`] owns a [`TopicRegistry`] behind a mutex and a [`TypeHierarchy`]
//! behind a read/write lock. Subscribers are held weakly; publishing resolves every
//! topic whose type the published value is assignable to and whose name is equal.
//!
//! ## Publish protocol
//! ```text
//! publish::<T>(sender, name, value)
//!   │
//!   ├─► lineage = hierarchy.lineage(T)                 (read lock, released)
//!   │
//!   ├─► lock registry ─────────────────────────────────────────────┐
//!   │     for record in registry (traversal order):                 │ serialized
//!   │       name == record.name && record.type ∈ lineage ?          │
//!   │         entry alive → snapshot (Arc<S>, handler)              │
//!   │         entry dead  → prune; record emptied → remove record   │
//!   │   unlock ─────────────────────────────────────────────────────┘
//!   │
//!   ├─► invoke every snapshot handler (value upcast to record type)
//!   └─► await all futures concurrently; failures logged, never returned
//! ```
//!
//! ## Rules
//! - No lock is held while a handler is called or awaited; handlers may re-enter the mediator.
//! - Record lookup for subscribe/unsubscribe is by exact `(type, name)`; publish matches by assignability.
//! - Unsubscribing never removes a record; only pruning does.
//! - Entries removed from the registry are dropped after the lock is released.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use statevisor::{Mediator, Sender};
//!
//! struct Panel;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mediator = Mediator::default();
//! let panel = Arc::new(Panel);
//!
//! mediator.subscribe_topic(&panel, "title", |_panel: Arc<Panel>, _sender: Sender, title: Arc<String>| async move {
//!     println!("title is now {title}");
//!     Ok(())
//! });
//!
//! let report = mediator
//!     .publish_topic(&Sender::new("editor"), "title", String::from("Hello"))
//!     .await;
//! assert_eq!(report.delivered, 1);
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::core::builder::MediatorBuilder;
use crate::core::config::MediatorConfig;
use crate::core::dispatch::{self, PublishReport};
use crate::error::{HandlerError, MediatorError};
use crate::subscribers::entry::erase_handler;
use crate::subscribers::{Sender, Subscribe, SubscriberEntry, SubscriberRef};
use crate::topics::hierarchy::erase;
use crate::topics::registry::TopicRegistry;
use crate::topics::{TopicKey, TopicName, TopicType, TypeHierarchy};

/// In-process publish/subscribe mediator.
pub struct Mediator {
    cfg: MediatorConfig,
    registry: Mutex<TopicRegistry>,
    hierarchy: RwLock<TypeHierarchy>,
}

impl Default for Mediator {
    fn default() -> Self {
        Self::new(MediatorConfig::default())
    }
}

impl Mediator {
    /// Creates a mediator with no topics and no declared subtypes.
    pub fn new(cfg: MediatorConfig) -> Self {
        Self::with_hierarchy(cfg, TypeHierarchy::new())
    }

    /// Creates a mediator with a pre-built subtype relation.
    pub fn with_hierarchy(cfg: MediatorConfig, hierarchy: TypeHierarchy) -> Self {
        Self {
            cfg,
            registry: Mutex::new(TopicRegistry::new()),
            hierarchy: RwLock::new(hierarchy),
        }
    }

    /// Returns a builder.
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::new()
    }

    /// Mediator configuration.
    pub fn config(&self) -> &MediatorConfig {
        &self.cfg
    }

    // ---------------------------
    // Type relation
    // ---------------------------

    /// Declares `D` a subtype of `B`: publishes of `D` also reach topics of `B`.
    ///
    /// `upcast` converts the published value for `B`'s handlers; `B` may be a trait object.
    pub fn declare_subtype<D, B, F>(&self, upcast: F) -> Result<(), MediatorError>
    where
        D: ?Sized + Send + Sync + 'static,
        B: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<D>) -> Arc<B> + Send + Sync + 'static,
    {
        self.hierarchy.write().declare::<D, B, F>(upcast)?;
        debug!(
            sub = std::any::type_name::<D>(),
            base = std::any::type_name::<B>(),
            "subtype declared"
        );
        Ok(())
    }

    /// True if a publish of `T` reaches topics of type `B`.
    pub fn is_assignable<B: ?Sized + 'static, T: ?Sized + 'static>(&self) -> bool {
        self.hierarchy
            .read()
            .is_assignable(TopicType::of::<B>(), TopicType::of::<T>())
    }

    // ---------------------------
    // Subscribe
    // ---------------------------

    /// Subscribes `handler` to unnamed topic `T` on behalf of `subscriber`.
    pub fn subscribe<T, S, F, Fut>(&self, subscriber: &Arc<S>, handler: F)
    where
        T: ?Sized + Send + Sync + 'static,
        S: Send + Sync + 'static,
        F: Fn(Arc<S>, Sender, Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.subscribe_topic(subscriber, TopicName::Unnamed, handler);
    }

    /// Subscribes `handler` to topic `(T, topic)` on behalf of `subscriber`.
    ///
    /// Always succeeds; subscribing the same subscriber twice registers two handlers.
    /// Only a weak reference to `subscriber` is kept.
    pub fn subscribe_topic<T, S, F, Fut>(
        &self,
        subscriber: &Arc<S>,
        topic: impl Into<TopicName>,
        handler: F,
    ) where
        T: ?Sized + Send + Sync + 'static,
        S: Send + Sync + 'static,
        F: Fn(Arc<S>, Sender, Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let key = TopicKey::of::<T>(topic);
        let handler = erase_handler::<S, T, F, Fut>(handler);
        let subscriber_ref = SubscriberRef::new(subscriber);

        debug!(
            subscriber = subscriber_ref.type_name(),
            topic = %key,
            "subscription received"
        );

        let mut registry = self.registry.lock();
        let id = registry.next_entry_id();
        let entry = SubscriberEntry::new(id, subscriber_ref, handler, key.ty());
        registry.add(key, entry);
    }

    /// Attaches a [`Subscribe<T>`] implementor to topic `(T, topic)`.
    pub fn attach<T, S>(&self, subscriber: &Arc<S>, topic: impl Into<TopicName>)
    where
        T: ?Sized + Send + Sync + 'static,
        S: Subscribe<T>,
    {
        debug!(
            subscriber = <S as Subscribe<T>>::name(&**subscriber),
            payload = std::any::type_name::<T>(),
            "attaching subscriber"
        );
        self.subscribe_topic::<T, S, _, _>(
            subscriber,
            topic,
            |me: Arc<S>, sender: Sender, value: Arc<T>| async move {
                me.on_publish(&sender, value).await
            },
        );
    }

    // ---------------------------
    // Publish
    // ---------------------------

    /// Publishes `value` on unnamed topic `T` (and every unnamed ancestor topic).
    pub async fn publish<T>(&self, sender: &Sender, value: T) -> PublishReport
    where
        T: Send + Sync + 'static,
    {
        self.publish_arc(sender, TopicName::Unnamed, Arc::new(value))
            .await
    }

    /// Publishes `value` on topic `(T, topic)` (and every ancestor of `T` with the same name).
    pub async fn publish_topic<T>(
        &self,
        sender: &Sender,
        topic: impl Into<TopicName>,
        value: T,
    ) -> PublishReport
    where
        T: Send + Sync + 'static,
    {
        self.publish_arc(sender, topic, Arc::new(value)).await
    }

    /// Publishes an already shared value; `T` may be unsized (e.g. a trait object).
    ///
    /// Resolves once every matched handler has finished. Handler failures are logged
    /// and counted in the report, never returned.
    pub async fn publish_arc<T>(
        &self,
        sender: &Sender,
        topic: impl Into<TopicName>,
        value: Arc<T>,
    ) -> PublishReport
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let ty = TopicType::of::<T>();
        let name = topic.into();
        let lineage = self.hierarchy.read().lineage(ty);

        debug!(
            sender = %sender,
            ty = %ty,
            topic = %name,
            lineage = lineage.len(),
            "publish received"
        );

        let scan = self.registry.lock().snapshot_and_prune(&name, &lineage);

        let mut report = PublishReport {
            topics: scan.topics,
            pruned: scan.pruned.len(),
            ..PublishReport::default()
        };
        if report.pruned > 0 {
            debug!(pruned = report.pruned, topic = %name, "pruned dead subscribers");
        }
        for key in &scan.removed_topics {
            debug!(topic = %key, "removed unused topic");
        }
        drop(scan.pruned);

        let value = erase(value);
        let invocations = dispatch::invoke(
            scan.live,
            &lineage,
            sender,
            &value,
            self.cfg.catch_panics,
        );
        dispatch::complete(invocations, self.cfg.concurrency_limit(), &mut report).await;
        report
    }

    // ---------------------------
    // Unsubscribe
    // ---------------------------

    /// Removes `subscriber`'s handlers from unnamed topic `T`. Returns how many were removed.
    pub fn unsubscribe<T, S>(&self, subscriber: &Arc<S>) -> usize
    where
        T: ?Sized + 'static,
        S: ?Sized,
    {
        self.unsubscribe_topic::<T, S>(subscriber, TopicName::Unnamed)
    }

    /// Removes `subscriber`'s handlers from the exact topic `(T, topic)`.
    ///
    /// Unknown topics are a silent no-op. Returns how many handlers were removed.
    pub fn unsubscribe_topic<T, S>(&self, subscriber: &Arc<S>, topic: impl Into<TopicName>) -> usize
    where
        T: ?Sized + 'static,
        S: ?Sized,
    {
        let key = TopicKey::of::<T>(topic);
        debug!(topic = %key, "unsubscribe received");

        let removed = self
            .registry
            .lock()
            .remove_where(&key, |e| e.subscriber.points_to(subscriber));
        removed.len()
    }

    /// Removes `subscriber`'s handlers from every topic. Returns how many were removed.
    pub fn unsubscribe_all<S: ?Sized>(&self, subscriber: &Arc<S>) -> usize {
        debug!("unsubscribe all received");
        let removed = self.registry.lock().remove_subscriber_everywhere(subscriber);
        removed.len()
    }

    // ---------------------------
    // Introspection / teardown
    // ---------------------------

    /// Keys of all topic records, in traversal order.
    pub fn topics(&self) -> Vec<TopicKey> {
        self.registry.lock().keys()
    }

    /// Number of topic records.
    pub fn topic_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Entries registered under the exact topic `(T, topic)`, dead ones not yet pruned included.
    pub fn subscriber_count<T: ?Sized + 'static>(&self, topic: impl Into<TopicName>) -> usize {
        self.registry
            .lock()
            .subscriber_count(&TopicKey::of::<T>(topic))
    }

    /// Topics a publish of `T` on `topic` would reach right now.
    pub fn matching_topics<T: ?Sized + 'static>(&self, topic: impl Into<TopicName>) -> Vec<TopicKey> {
        let name = topic.into();
        let lineage = self.hierarchy.read().lineage(TopicType::of::<T>());
        let registry = self.registry.lock();
        let keys = registry
            .find_matching(&name, &lineage)
            .map(|r| r.key().clone())
            .collect();
        keys
    }

    /// Drops every topic record. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let records = self.registry.lock().clear();
        debug!(topics = records.len(), "registry cleared");
        records.len()
    }
}

impl std::fmt::Debug for Mediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mediator")
            .field("cfg", &self.cfg)
            .field("topics", &self.topic_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        hits: AtomicUsize,
    }

    #[tokio::test]
    async fn test_publish_reaches_exact_topic() {
        let m = Mediator::default();
        let c = Arc::new(Counter::default());
        m.subscribe(&c, |c: Arc<Counter>, _s: Sender, v: Arc<u32>| async move {
            c.hits.fetch_add(*v as usize, Ordering::SeqCst);
            Ok(())
        });

        let report = m.publish(&Sender::anonymous(), 5u32).await;
        assert_eq!(report.topics, 1);
        assert_eq!(report.delivered, 1);
        assert_eq!(c.hits.load(Ordering::SeqCst), 5);

        let report = m.publish_topic(&Sender::anonymous(), "other", 5u32).await;
        assert_eq!(report.topics, 0);
        assert_eq!(c.hits.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_subscriber_is_not_kept_alive() {
        let m = Mediator::default();
        let c = Arc::new(Counter::default());
        m.subscribe(&c, |_c: Arc<Counter>, _s: Sender, _v: Arc<u32>| async { Ok(()) });
        assert_eq!(Arc::strong_count(&c), 1);

        drop(c);
        let report = m.publish(&Sender::anonymous(), 1u32).await;
        assert_eq!(report.pruned, 1);
        assert_eq!(report.invoked(), 0);
        assert_eq!(m.topic_count(), 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_counts() {
        let m = Mediator::default();
        let c = Arc::new(Counter::default());
        for _ in 0..2 {
            m.subscribe_topic(&c, "a", |_c: Arc<Counter>, _s: Sender, _v: Arc<u32>| async { Ok(()) });
        }
        m.subscribe(&c, |_c: Arc<Counter>, _s: Sender, _v: Arc<u32>| async { Ok(()) });

        assert_eq!(m.unsubscribe_topic::<u32, _>(&c, "missing"), 0);
        assert_eq!(m.unsubscribe_topic::<u32, _>(&c, "a"), 2);
        assert_eq!(m.unsubscribe_all(&c), 1);
        assert_eq!(m.topic_count(), 2);
    }

    #[tokio::test]
    async fn test_clear_drops_every_record() {
        let m = Mediator::default();
        let c = Arc::new(Counter::default());
        m.subscribe(&c, |_c: Arc<Counter>, _s: Sender, _v: Arc<u8>| async { Ok(()) });
        m.subscribe(&c, |_c: Arc<Counter>, _s: Sender, _v: Arc<u16>| async { Ok(()) });

        assert_eq!(m.clear(), 2);
        assert!(m.topics().is_empty());
        assert_eq!(m.publish(&Sender::anonymous(), 1u8).await.topics, 0);
    }
}

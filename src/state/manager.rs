//! # StateManager - commit, persist, replay.
//!
//! A commit writes the value to storage first and then publishes it through the
//! mediator, awaiting delivery to every current subscriber.
//!
//! ```text
//! commit_state::<T>(v)             commit_named_state::<T>("cart", v)
//!   ├─► store(type_name::<T>(), v)    ├─► store("cart", v)
//!   └─► publish::<T>(v)               └─► publish_topic::<T>("cart", v)
//!
//! get_state::<T>()        → retrieve(type_name::<T>()) or T::default()
//! get_named_state::<T>(n) → retrieve(n)                 or T::default()
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use serde::{Deserialize, Serialize};
//! use statevisor::state::{SessionStorage, StateManager};
//! use statevisor::{Mediator, Sender};
//!
//! #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
//! struct Theme { dark: bool }
//!
//! struct Header;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let state = StateManager::new(SessionStorage::new(), Mediator::builder().build());
//! let header = Arc::new(Header);
//! state.on_committed(&header, |_h: Arc<Header>, _s: Sender, theme: Arc<Theme>| async move {
//!     assert!(theme.dark);
//!     Ok(())
//! });
//!
//! let report = state.commit_state(Theme { dark: true }).await;
//! assert_eq!(report.delivered, 1);
//! assert_eq!(state.get_state::<Theme>().await, Theme { dark: true });
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::{Mediator, PublishReport};
use crate::error::{HandlerError, StateError};
use crate::state::persistence::StoragePersistence;
use crate::subscribers::Sender;

/// Storage-backed state facade over a [`Mediator`].
pub struct StateManager<P> {
    store: P,
    mediator: Arc<Mediator>,
    sender: Sender,
}

impl<P: StoragePersistence> StateManager<P> {
    /// Creates a facade publishing as `"state_manager"`.
    pub fn new(store: P, mediator: Arc<Mediator>) -> Self {
        Self {
            store,
            mediator,
            sender: Sender::new("state_manager"),
        }
    }

    /// Overrides the sender handed to subscribers on commit.
    pub fn with_sender(mut self, sender: Sender) -> Self {
        self.sender = sender;
        self
    }

    /// Underlying mediator.
    pub fn mediator(&self) -> &Arc<Mediator> {
        &self.mediator
    }

    /// Underlying storage.
    pub fn store(&self) -> &P {
        &self.store
    }

    /// Last committed `T`, or `T::default()`.
    pub async fn get_state<T>(&self) -> T
    where
        T: DeserializeOwned + Default + Send + 'static,
    {
        self.store
            .retrieve::<T>(state_key::<T>())
            .await
            .unwrap_or_default()
    }

    /// Last `T` committed under `name`, or `T::default()`.
    pub async fn get_named_state<T>(&self, name: &str) -> T
    where
        T: DeserializeOwned + Default + Send + 'static,
    {
        self.store.retrieve::<T>(name).await.unwrap_or_default()
    }

    /// Stores `value` under `T`'s type name, then publishes it on unnamed topic `T`.
    pub async fn commit_state<T>(&self, value: T) -> PublishReport
    where
        T: Serialize + Send + Sync + 'static,
    {
        let key = state_key::<T>();
        self.store.store(key, &value).await;
        tracing::debug!(key, backend = self.store.name(), "state committed");
        self.mediator.publish(&self.sender, value).await
    }

    /// Stores `value` under `name`, then publishes it on topic `(T, name)`.
    ///
    /// Returns [`StateError::EmptyName`] for a blank name; nothing is stored or published.
    pub async fn commit_named_state<T>(&self, name: &str, value: T) -> Result<PublishReport, StateError>
    where
        T: Serialize + Send + Sync + 'static,
    {
        if name.trim().is_empty() {
            return Err(StateError::EmptyName);
        }
        self.store.store(name, &value).await;
        tracing::debug!(key = name, backend = self.store.name(), "state committed");
        Ok(self.mediator.publish_topic(&self.sender, name, value).await)
    }

    /// Calls `handler` after every unnamed commit of `T`.
    pub fn on_committed<T, S, F, Fut>(&self, subscriber: &Arc<S>, handler: F)
    where
        T: Send + Sync + 'static,
        S: Send + Sync + 'static,
        F: Fn(Arc<S>, Sender, Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.mediator.subscribe::<T, S, F, Fut>(subscriber, handler);
    }

    /// Calls `handler` after every commit of `T` under `name`.
    pub fn on_committed_named<T, S, F, Fut>(&self, subscriber: &Arc<S>, name: &str, handler: F)
    where
        T: Send + Sync + 'static,
        S: Send + Sync + 'static,
        F: Fn(Arc<S>, Sender, Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.mediator
            .subscribe_topic::<T, S, F, Fut>(subscriber, name, handler);
    }
}

/// Storage key of unnamed state.
fn state_key<T: ?Sized>() -> &'static str {
    std::any::type_name::<T>()
}

//! # statevisor
//!
//! **Statevisor** is an in-process publish/subscribe mediator for Rust.
//!
//! Subscribers register async handlers on typed, optionally named topics. The
//! mediator holds subscribers **weakly**: dropping the last `Arc` of a subscriber is
//! all it takes to stop receiving values, and the dead entry is pruned by the next
//! publish that scans its topic. On top of the mediator, a small state layer persists
//! the last committed value per key and replays each commit to subscribers.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  Panel A (Arc)      Panel B (Arc)      Service C (Arc)
//!      │ subscribe        │ subscribe          │ attach (Subscribe<T>)
//!      ▼                  ▼                    ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Mediator                                                         │
//! │  - TypeHierarchy (declared subtypes, upcasts)     [RwLock]        │
//! │  - TopicRegistry (records of weak entries)        [Mutex]         │
//! │      (User, <unnamed>) ─► [Weak A, Weak C]                        │
//! │      (User, "admin")   ─► [Weak B]                                │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        │ publish::<Admin>(sender, "admin", v)
//!        ▼
//!   lock ─► match (type ∈ lineage(Admin), name == "admin") ─► snapshot live, prune dead ─► unlock
//!        │
//!        ├──► handler B(Arc<B>, sender, Arc<User>)   ┐
//!        └──► ...                                    ┘ awaited together; failures logged
//! ```
//!
//! ### State commits
//! ```text
//! StateManager::commit_state(v) ─► StoragePersistence::store(key, v) ─► Mediator::publish(v)
//!                                   (SessionStorage | LocalStorage | CookieStorage)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Mediator**      | Subscribe, publish, unsubscribe on typed, named topics.        | [`Mediator`], [`PublishReport`]             |
//! | **Subscribers**   | Weakly held closures or trait implementors.                   | [`Subscribe`], [`Sender`], [`SubscriberRef`]|
//! | **Topics**        | Exact identity, explicit subtype relation.                     | [`TopicKey`], [`TopicName`], [`TypeHierarchy`] |
//! | **Errors**        | Typed errors for configuration and handler failures.           | [`MediatorError`], [`HandlerError`]         |
//! | **Configuration** | Per-instance settings and builder.                            | [`MediatorConfig`], [`MediatorBuilder`]     |
//! | **State**         | Persist and replay committed values (feature `state`).         | `state::StateManager`, `state::StoragePersistence` |
//!
//! ## Optional features
//! - `state` _(default)_: exposes the [`state`] module and its storage backends.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use statevisor::{HandlerError, Mediator, Sender};
//!
//! struct User { name: String }
//! struct Admin { name: String }
//! struct Sidebar;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let mediator = Mediator::builder().build();
//!     mediator.declare_subtype::<Admin, User, _>(|a: Arc<Admin>| Arc::new(User { name: a.name.clone() }))?;
//!
//!     let sidebar = Arc::new(Sidebar);
//!     mediator.subscribe_topic(&sidebar, "current", |_me: Arc<Sidebar>, _from: Sender, user: Arc<User>| async move {
//!         if user.name.is_empty() {
//!             return Err(HandlerError::fail("anonymous user"));
//!         }
//!         println!("signed in as {}", user.name);
//!         Ok(())
//!     });
//!
//!     // An Admin is delivered to User subscribers of the same topic name.
//!     let report = mediator
//!         .publish_topic(&Sender::new("login"), "current", Admin { name: "root".into() })
//!         .await;
//!     assert_eq!(report.delivered, 1);
//!
//!     // Dropping the subscriber is enough; the next publish prunes it.
//!     drop(sidebar);
//!     let report = mediator
//!         .publish_topic(&Sender::new("login"), "current", User { name: "ann".into() })
//!         .await;
//!     assert_eq!(report.pruned, 1);
//!     assert_eq!(mediator.topic_count(), 0);
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod subscribers;
mod topics;

#[cfg(feature = "state")]
pub mod state;

// ---- Public re-exports ----

pub use crate::core::{Mediator, MediatorBuilder, MediatorConfig, PublishReport};
pub use error::{HandlerError, MediatorError};
pub use subscribers::{Sender, Subscribe, SubscriberEntry, SubscriberRef};
pub use topics::{TopicKey, TopicName, TopicType, TypeHierarchy};

#[cfg(feature = "state")]
pub use error::{StateError, StorageError};

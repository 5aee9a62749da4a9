//! Mediator core: registry guard, dispatch, configuration.
//!
//! The only public entry point of this module is [`Mediator`] (plus its
//! [`MediatorBuilder`], [`MediatorConfig`] and the [`PublishReport`] it returns).
//!
//! Internal modules:
//! - [`mediator`]: subscribe / publish / unsubscribe under the registry lock;
//! - [`dispatch`]: invokes snapshot handlers and awaits them concurrently;
//! - [`config`]: per-instance settings;
//! - [`builder`]: construction with a pre-declared type relation.

mod builder;
mod config;
mod dispatch;
mod mediator;

pub use builder::MediatorBuilder;
pub use config::MediatorConfig;
pub use dispatch::PublishReport;
pub use mediator::Mediator;

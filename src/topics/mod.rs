//! # Topics: identity, type relation, registry.
//!
//! - [`TopicType`] / [`TopicName`] / [`TopicKey`] - what a topic is;
//! - [`TypeHierarchy`] - which payload types may be delivered to which topics;
//! - `registry` - the records and subscriber lists the mediator guards.

pub(crate) mod hierarchy;
mod key;
pub(crate) mod registry;

pub use hierarchy::TypeHierarchy;
pub use key::{TopicKey, TopicName, TopicType};

//! # Trait-based subscribers.
//!
//! [`Subscribe`] is the object-style alternative to closure handlers: a type implements
//! it for each payload it cares about and attaches itself with
//! [`Mediator::attach`](crate::Mediator::attach).
//!
//! ## Contract
//! - The subscriber is still held weakly; attaching does not keep it alive.
//! - Errors are reported by the mediator (`warn`) and never reach the publisher.
//! - Handlers may call back into the mediator (subscribe, unsubscribe, publish).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use statevisor::{HandlerError, Mediator, Sender, Subscribe};
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl Subscribe<String> for Audit {
//!     async fn on_publish(&self, sender: &Sender, value: Arc<String>) -> Result<(), HandlerError> {
//!         println!("{sender} -> {value}");
//!         Ok(())
//!     }
//! }
//!
//! let mediator = Mediator::default();
//! let audit = Arc::new(Audit);
//! mediator.attach::<String, _>(&audit, "audit");
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::subscribers::Sender;

/// Receives values of type `T` published on the topics it is attached to.
#[async_trait]
pub trait Subscribe<T: ?Sized + Send + Sync + 'static>: Send + Sync + 'static {
    /// Handles one published value.
    async fn on_publish(&self, sender: &Sender, value: Arc<T>) -> Result<(), HandlerError>;

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

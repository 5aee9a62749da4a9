//! # Committed state on top of the mediator.
//!
//! [`StateManager`] keeps the last committed value per key in a
//! [`StoragePersistence`] backend and replays each commit to subscribers.
//!
//! ## Backends
//! | Backend            | Medium                            | Lifetime            |
//! |--------------------|-----------------------------------|---------------------|
//! | [`SessionStorage`] | in-memory map                     | process             |
//! | [`LocalStorage`]   | one JSON file per key in a dir    | persistent          |
//! | [`CookieStorage`]  | cookie jar (`Cookie`/`Set-Cookie`) | client round-trip   |
//!
//! Backends never return errors: an unavailable medium is logged and reads come back empty.
//!
//! Enabled by the `state` feature (on by default).

mod cookie;
mod local;
mod manager;
mod persistence;
mod session;

pub use cookie::{CookieConfig, CookieStorage, SameSite};
pub use local::LocalStorage;
pub use manager::StateManager;
pub use persistence::StoragePersistence;
pub use session::SessionStorage;

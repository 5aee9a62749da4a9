//! # Mediator configuration.
//!
//! Provides [`MediatorConfig`], the settings of one [`Mediator`](crate::Mediator) instance.
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → unlimited (all handler futures of one publish polled together)

/// Configuration for one mediator instance.
///
/// ## Field semantics
/// - `catch_panics`: isolate panicking handlers (`true`) or let the panic unwind into the publisher
/// - `max_concurrent`: handler futures polled at once per publish (`0` = unlimited)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct MediatorConfig {
    /// Catch panics raised by handlers (while being called or while being polled).
    ///
    /// A caught panic counts as a failed delivery and is logged like a handler error.
    pub catch_panics: bool,

    /// Maximum number of handler futures of a single publish polled concurrently.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = at most `n` handlers in flight; the rest start as earlier ones finish
    ///
    /// Handlers are always *invoked* during the scan; this only bounds polling.
    pub max_concurrent: usize,
}

impl MediatorConfig {
    /// Returns the per-publish concurrency limit as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` handler futures polled at once
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }
}

impl Default for MediatorConfig {
    /// Default configuration:
    ///
    /// - `catch_panics = true` (one bad handler never takes down a publish)
    /// - `max_concurrent = 0` (unlimited)
    fn default() -> Self {
        Self {
            catch_panics: true,
            max_concurrent: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrency_limit_sentinel() {
        let mut cfg = MediatorConfig::default();
        assert!(cfg.catch_panics);
        assert_eq!(cfg.concurrency_limit(), None);

        cfg.max_concurrent = 4;
        assert_eq!(cfg.concurrency_limit(), Some(4));
    }
}

//! Publisher identity handed to every handler of one publish call.

use std::borrow::Cow;
use std::fmt;

/// Who published a value.
///
/// A cheap, cloneable label; handlers use it to tell (for example) a state commit
/// from a direct publish.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Sender {
    name: Cow<'static, str>,
}

impl Sender {
    /// Creates a sender with the given label.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into() }
    }

    /// Sender without an identity.
    pub fn anonymous() -> Self {
        Self::new("anonymous")
    }

    /// Sender label.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for Sender {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

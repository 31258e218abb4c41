//! Engine configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default kill switch for the number of firings in one run.
pub const DEFAULT_MAX_FIRINGS: usize = 10_000;

/// How the engine finds new activations after a firing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MatchMode {
    /// Match only tuples that include a fact asserted by the firing.
    #[default]
    Incremental,
    /// Rematch every rule against the whole store.
    Full,
}

/// Configuration for an [`Engine`](crate::Engine).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    /// Matching strategy after each firing.
    pub match_mode: MatchMode,
    /// Maximum firings per run; `None` disables the limit.
    pub max_firings: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::Incremental,
            max_firings: Some(DEFAULT_MAX_FIRINGS),
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the matching strategy.
    #[must_use]
    pub fn match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Sets the firing limit.
    #[must_use]
    pub fn max_firings(mut self, limit: usize) -> Self {
        self.max_firings = Some(limit);
        self
    }

    /// Removes the firing limit.
    #[must_use]
    pub fn unlimited(mut self) -> Self {
        self.max_firings = None;
        self
    }
}

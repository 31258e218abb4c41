//! Type descriptors for slot schemas.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type descriptor for a slot.
///
/// A slot's type is fixed by its default value and every asserted value
/// must carry the same type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Type {
    /// 64-bit signed integer.
    Int,
    /// Symbol (enumerated string).
    Symbol,
    /// Boolean-like yes/no.
    Bool,
}

impl Type {
    /// Returns true if values of this type can be ordered by `<`, `>` etc.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int)
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "integer"),
            Self::Symbol => write!(f, "symbol"),
            Self::Bool => write!(f, "yes/no"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

//! Shared result alias.
//!
//! Domain crates keep their own error enums. Concrete fallible operations
//! return them wrapped in a [`rootcause::Report`], which `?` builds from the
//! bare enum value. Trait seams return the bare enum.

use rootcause::Report;

/// Result carrying a [`Report`] over the context type `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
